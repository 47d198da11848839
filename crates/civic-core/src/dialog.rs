//! Progress update dialog state
//!
//! UI-side state for the department "Update Progress" dialog, kept apart from
//! the stored report. Confirming hands the edits to the [`ProgressEngine`];
//! cancelling or re-opening for another issue drops them and revokes any
//! photo previews.

use crate::attachments::{AttachmentLimits, AttachmentManager};
use crate::config::CivicConfig;
use crate::error::UpdateError;
use crate::preview::PreviewRegistry;
use crate::progress::{ProgressEngine, ProgressUpdate, UpdateOutcome};
use crate::types::{IssueStatus, TrackingId};

/// Edits in progress for one issue
#[derive(Debug)]
pub struct ProgressUpdateDraft {
    issue_id: TrackingId,
    status: Option<IssueStatus>,
    note: String,
    photos: AttachmentManager,
}

impl ProgressUpdateDraft {
    #[inline]
    #[must_use]
    pub fn issue_id(&self) -> &TrackingId {
        &self.issue_id
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<IssueStatus> {
        self.status
    }

    pub fn select_status(&mut self, status: Option<IssueStatus>) {
        self.status = status;
    }

    #[inline]
    #[must_use]
    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn set_note(&mut self, note: impl Into<String>) {
        self.note = note.into();
    }

    #[inline]
    #[must_use]
    pub fn photos(&self) -> &AttachmentManager {
        &self.photos
    }

    #[inline]
    pub fn photos_mut(&mut self) -> &mut AttachmentManager {
        &mut self.photos
    }

    fn to_update(&self) -> ProgressUpdate {
        ProgressUpdate {
            new_status: self.status,
            note: self.note.clone(),
            new_attachments: self
                .photos
                .attachments()
                .iter()
                .map(|a| a.image().clone())
                .collect(),
            assign_to: None,
        }
    }
}

/// Whether the dialog is showing, and for which issue
#[derive(Debug, Default)]
pub enum UpdateDialog {
    #[default]
    Closed,
    Open(ProgressUpdateDraft),
}

impl UpdateDialog {
    /// Open for `issue_id`, dropping any edits for a previous issue
    pub fn open(&mut self, issue_id: TrackingId, registry: PreviewRegistry, config: &CivicConfig) {
        tracing::debug!(tracking_id = %issue_id, "update dialog opened");
        *self = UpdateDialog::Open(ProgressUpdateDraft {
            issue_id,
            status: None,
            note: String::new(),
            // The report enforces the cap when photos are merged
            photos: AttachmentManager::new(
                registry,
                AttachmentLimits::from_config(config).without_count_cap(),
            ),
        });
    }

    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, UpdateDialog::Open(_))
    }

    #[must_use]
    pub fn selected_issue(&self) -> Option<&TrackingId> {
        match self {
            UpdateDialog::Open(draft) => Some(draft.issue_id()),
            UpdateDialog::Closed => None,
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut ProgressUpdateDraft> {
        match self {
            UpdateDialog::Open(draft) => Some(draft),
            UpdateDialog::Closed => None,
        }
    }

    /// Close and drop all edits
    pub fn cancel(&mut self) {
        if let UpdateDialog::Open(draft) = std::mem::take(self) {
            tracing::debug!(tracking_id = %draft.issue_id, "update dialog cancelled");
        }
    }

    /// Apply the edits. Closes on success; stays open with edits intact
    /// when the update is rejected. Returns `None` if the dialog was closed.
    pub fn confirm(&mut self, engine: &ProgressEngine) -> Option<Result<UpdateOutcome, UpdateError>> {
        let UpdateDialog::Open(draft) = self else {
            return None;
        };

        let result = engine.apply_update(&draft.issue_id, draft.to_update());
        if result.is_ok() {
            *self = UpdateDialog::Closed;
        }
        Some(result)
    }
}
