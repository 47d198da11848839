//! Civic Core - issue reporting and progress tracking
//!
//! The non-UI core of a neighborhood issue reporting service:
//! - Collects a citizen's report in a [`ReportDraft`] (field store)
//! - Keeps at most three photos per report with revocable previews
//! - Fills in coordinates from the device position without blocking the form
//! - Validates and submits drafts, assigning `YYYY-NNNN` tracking ids
//! - Moves submitted reports through the status lifecycle with notes and photos
//!
//! # Example
//!
//! ```rust,ignore
//! use civic_core::prelude::*;
//!
//! let desk = CivicDesk::in_memory(CivicConfig::default());
//! let mut draft = desk.new_draft();
//! draft.set_issue_type(Some(IssueType::Pothole));
//! draft.set_urgency(Some(Urgency::High));
//! draft.set_location_text("Main St");
//! draft.set_description("Large hole");
//!
//! let receipt = desk.submit(&mut draft)?;
//! desk.assign(&receipt.tracking_id, Department::PublicWorks, "Crew scheduled")?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod attachments;
pub mod audit;
pub mod config;
pub mod desk;
pub mod dialog;
pub mod draft;
pub mod error;
pub mod events;
pub mod location;
pub mod preview;
pub mod progress;
pub mod query;
pub mod state_machine;
pub mod store;
pub mod submission;
pub mod types;

// Re-exports for convenience
pub use attachments::{
    AddReport, Attachment, AttachmentLimits, AttachmentManager, ImageBlob, SkipReason,
};
pub use audit::{AuditLog, AuditRecord};
pub use config::CivicConfig;
pub use desk::CivicDesk;
pub use dialog::{ProgressUpdateDraft, UpdateDialog};
pub use draft::{DraftState, LocationTicket, ReportDraft};
pub use error::{
    AttachmentError, AuditError, CivicError, ConfigError, LocationError, ParseError, StoreError,
    SubmissionError, UpdateError, ValidationError,
};
pub use events::{EventBus, IssueEvent};
pub use location::{
    GeolocationProvider, LocationApplied, LocationOutcome, LocationResolver, NoGeolocation,
    SharedDraft,
};
pub use preview::{PreviewHandle, PreviewId, PreviewRegistry};
pub use progress::{ProgressEngine, ProgressUpdate, UpdateOutcome};
pub use query::{DashboardStats, IssueFilter};
pub use state_machine::{allowed_transitions, validate_transition, IllegalTransition};
pub use store::{InMemoryIssueStore, IssueReport, IssueStore, NewIssue, ProgressEntry};
pub use submission::{SubmissionEngine, SubmissionReceipt};
pub use types::{
    Contact, Coordinates, Department, Field, IssueStatus, IssueType, Location, TrackingId, Urgency,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Civic Core
    pub use crate::{
        CivicConfig, CivicDesk, Department, ImageBlob, IssueFilter, IssueReport, IssueStatus,
        IssueType, ProgressUpdate, ReportDraft, SubmissionError, TrackingId, UpdateError, Urgency,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::prelude::*;

    #[test]
    fn report_to_resolution() {
        let desk = CivicDesk::in_memory(CivicConfig::default());
        let mut draft = desk.new_draft();
        draft.set_issue_type(Some(IssueType::BrokenStreetlight));
        draft.set_urgency(Some(Urgency::Medium));
        draft.set_location_text("Oak Ave near the park");
        draft.set_description("Light out for a week");

        let receipt = desk.submit(&mut draft).unwrap();
        let id = receipt.tracking_id;

        desk.assign(&id, Department::StreetMaintenance, "").unwrap();
        desk.apply_update(&id, ProgressUpdate::new().with_status(IssueStatus::InProgress))
            .unwrap();
        let outcome = desk
            .apply_update(
                &id,
                ProgressUpdate::new()
                    .with_status(IssueStatus::Resolved)
                    .with_note("Bulb replaced"),
            )
            .unwrap();

        assert_eq!(outcome.report.status(), IssueStatus::Resolved);
        assert_eq!(outcome.report.department(), Some(Department::StreetMaintenance));
        assert_eq!(desk.audit().len(), 4);
        assert!(desk.audit().verify_integrity().is_ok());
    }
}
