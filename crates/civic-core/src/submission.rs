//! Validation & submission engine
//!
//! `Draft -> Validating -> Rejected | Submitted`
//!
//! A rejected draft stays editable with its missing fields attached. A
//! submitted draft is terminal: the store has assigned its tracking id and
//! the `Submitted` event has been published, in that order.

use crate::audit::AuditLog;
use crate::draft::{DraftState, ReportDraft};
use crate::error::{SubmissionError, ValidationError};
use crate::events::{EventBus, IssueEvent};
use crate::store::{IssueStore, NewIssue};
use crate::types::{IssueStatus, TrackingId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Confirmation returned for an accepted report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub tracking_id: TrackingId,
    pub status: IssueStatus,
    pub created_at: DateTime<Utc>,
}

impl SubmissionReceipt {
    /// Text for the confirmation toast
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "Your report has been submitted and assigned a tracking number #{}.",
            self.tracking_id
        )
    }
}

/// Check a draft's required fields and build the store payload
///
/// # Errors
/// - `ValidationError` listing exactly the empty required fields
pub fn validate(draft: &ReportDraft) -> Result<NewIssue, ValidationError> {
    let missing = draft.missing_fields();
    match (draft.issue_type(), draft.urgency()) {
        (Some(issue_type), Some(urgency)) if missing.is_empty() => Ok(NewIssue {
            issue_type,
            urgency,
            location: draft.location(),
            description: draft.description().trim().to_string(),
            contact: draft.contact(),
            attachments: draft
                .attachments()
                .attachments()
                .iter()
                .map(|a| a.image().clone())
                .collect(),
            created_at: Utc::now(),
        }),
        _ => Err(ValidationError::new(missing)),
    }
}

/// Turns drafts into stored reports
pub struct SubmissionEngine {
    store: Arc<dyn IssueStore>,
    events: EventBus,
    audit: Arc<AuditLog>,
}

impl std::fmt::Debug for SubmissionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionEngine").finish_non_exhaustive()
    }
}

impl SubmissionEngine {
    #[must_use]
    pub fn new(store: Arc<dyn IssueStore>, events: EventBus, audit: Arc<AuditLog>) -> Self {
        Self {
            store,
            events,
            audit,
        }
    }

    /// Submit a draft
    ///
    /// On success the draft's previews are revoked and it becomes
    /// `Submitted`. On failure neither the store nor the event bus is
    /// touched; validation failures are also recorded on the draft.
    ///
    /// # Errors
    /// - `SubmissionError::Validation` if a required field is empty
    /// - `SubmissionError::AlreadySubmitted` / `Discarded` for finished drafts
    /// - `SubmissionError::Store` if the store refuses the report
    pub fn submit(&self, draft: &mut ReportDraft) -> Result<SubmissionReceipt, SubmissionError> {
        match draft.state() {
            DraftState::Editing => {}
            DraftState::Submitted(id) => return Err(SubmissionError::AlreadySubmitted(id.clone())),
            DraftState::Discarded => return Err(SubmissionError::Discarded),
        }

        tracing::debug!("validating report draft");
        let issue = match validate(draft) {
            Ok(issue) => issue,
            Err(err) => {
                tracing::info!(missing = %err, "report rejected");
                draft.record_rejection(err.clone());
                return Err(err.into());
            }
        };
        let attachment_count = issue.attachments.len();
        let issue_type = issue.issue_type;

        let report = self.store.create(issue)?;
        let tracking_id = report.tracking_id().clone();

        draft.attachments_mut().clear();
        draft.mark_submitted(tracking_id.clone());

        self.audit.append(
            &tracking_id,
            "submitted",
            format!("{} ({}), {attachment_count} photo(s)", issue_type, report.urgency()),
        );
        tracing::info!(%tracking_id, issue_type = %issue_type, "report submitted");
        self.events.publish(IssueEvent::Submitted {
            tracking_id: tracking_id.clone(),
        });

        Ok(SubmissionReceipt {
            tracking_id,
            status: report.status(),
            created_at: report.created_at(),
        })
    }
}
