//! Progress update engine
//!
//! Applies department updates to stored reports:
//! - Status moves follow the transition table in [`crate::state_machine`]
//! - Notes are appended to the report's progress log, never edited
//! - Photos are merged under the report's cumulative attachment cap
//!
//! Every update names a status, a note, or both. Every rejection leaves the
//! stored report untouched. Photos that fail the per-image checks or do not
//! fit under the cap are reported as non-fatal warnings alongside the
//! applied update.

use crate::attachments::{AttachmentLimits, ImageBlob};
use crate::audit::AuditLog;
use crate::error::{StoreError, UpdateError};
use crate::events::{EventBus, IssueEvent};
use crate::state_machine;
use crate::store::{IssueReport, IssueStore, ProgressEntry};
use crate::types::{Department, IssueStatus, TrackingId};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;

/// Requested change to an existing report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// `None` keeps the current status and requires a note
    pub new_status: Option<IssueStatus>,
    pub note: String,
    pub new_attachments: Vec<ImageBlob>,
    /// Route to (or re-route to) a department
    pub assign_to: Option<Department>,
}

impl ProgressUpdate {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: IssueStatus) -> Self {
        self.new_status = Some(status);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_attachments(mut self, images: Vec<ImageBlob>) -> Self {
        self.new_attachments = images;
        self
    }

    #[inline]
    #[must_use]
    pub fn assigning(mut self, department: Department) -> Self {
        self.assign_to = Some(department);
        self
    }
}

/// Applied update plus anything the caller should be told about
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    /// Report as stored after the update
    pub report: IssueReport,
    /// Non-fatal problems, e.g. `AttachmentLimitReached`
    pub warnings: Vec<UpdateError>,
}

/// Fully checked update, ready to store
#[derive(Debug)]
struct Plan {
    entry: ProgressEntry,
    attachments: Vec<ImageBlob>,
    warnings: Vec<UpdateError>,
}

/// Work out what `update` would do to `report` without touching it
fn plan(
    report: &IssueReport,
    update: ProgressUpdate,
    limits: &AttachmentLimits,
) -> Result<Plan, UpdateError> {
    let current = report.status();
    if current.is_terminal() {
        return Err(UpdateError::AlreadyResolved(report.tracking_id().clone()));
    }

    let note = Some(update.note.trim())
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    // A status or a note must be chosen
    if update.new_status.is_none() && note.is_none() {
        return Err(UpdateError::InvalidTransition {
            from: current,
            to: current,
        });
    }

    let target = match update.new_status {
        Some(IssueStatus::Pending) => {
            return Err(UpdateError::InvalidTransition {
                from: current,
                to: IssueStatus::Pending,
            })
        }
        Some(to) if to != current => {
            state_machine::validate_transition(current, to)
                .map_err(|e| UpdateError::InvalidTransition { from: e.from, to: e.to })?;
            to
        }
        _ => current,
    };

    let department = match (target, update.assign_to) {
        (IssueStatus::Assigned, None) if report.department().is_none() => {
            return Err(UpdateError::DepartmentRequired)
        }
        (_, Some(dept)) if report.department() != Some(dept) => Some(dept),
        _ => None,
    };

    let mut warnings = Vec::new();
    let mut attachments = Vec::with_capacity(update.new_attachments.len());
    for image in update.new_attachments {
        match limits.check(&image) {
            Some(reason) => warnings.push(UpdateError::AttachmentSkipped {
                file_name: image.file_name,
                reason,
            }),
            None => attachments.push(image),
        }
    }

    let limit = limits.max_count.unwrap_or(usize::MAX);
    let room = limit.saturating_sub(report.attachments().len());
    let dropped = attachments.len().saturating_sub(room);
    attachments.truncate(room);
    if dropped > 0 {
        warnings.push(UpdateError::AttachmentLimitReached { limit, dropped });
    }

    let changed =
        target != current || department.is_some() || note.is_some() || !attachments.is_empty();
    if !changed {
        // Photos were all that was offered and none were kept
        return Err(warnings.pop().unwrap_or(UpdateError::NoChange));
    }

    Ok(Plan {
        entry: ProgressEntry {
            at: Utc::now(),
            from: current,
            to: target,
            note,
            department,
            attachments_added: attachments.len(),
        },
        attachments,
        warnings,
    })
}

/// Applies progress updates through the issue store
///
/// Updates are serialized: one update is read, checked, stored, audited and
/// published before the next one reads the report.
pub struct ProgressEngine {
    store: Arc<dyn IssueStore>,
    events: EventBus,
    audit: Arc<AuditLog>,
    limits: AttachmentLimits,
    writer: Mutex<()>,
}

impl std::fmt::Debug for ProgressEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressEngine")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl ProgressEngine {
    #[must_use]
    pub fn new(
        store: Arc<dyn IssueStore>,
        events: EventBus,
        audit: Arc<AuditLog>,
        limits: AttachmentLimits,
    ) -> Self {
        Self {
            store,
            events,
            audit,
            limits,
            writer: Mutex::new(()),
        }
    }

    /// Apply an update to the report `id`
    ///
    /// # Errors
    /// - `UpdateError::NotFound` if no report has this id
    /// - `UpdateError::AlreadyResolved` if the report is resolved
    /// - `UpdateError::InvalidTransition` if the status move is not allowed,
    ///   or if neither a status nor a note was given
    /// - `UpdateError::DepartmentRequired` when assigning without a department
    /// - `UpdateError::NoChange` if nothing would change
    /// - `UpdateError::AttachmentLimitReached` or `AttachmentSkipped` if
    ///   photos were the only change and none were kept
    pub fn apply_update(
        &self,
        id: &TrackingId,
        update: ProgressUpdate,
    ) -> Result<UpdateOutcome, UpdateError> {
        let _writer = self.writer.lock();
        let mut report = self.store.get(id).map_err(store_error)?;

        let Plan {
            entry,
            attachments,
            warnings,
        } = match plan(&report, update, &self.limits) {
            Ok(plan) => plan,
            Err(err) => {
                tracing::info!(tracking_id = %id, error = %err, "update rejected");
                return Err(err);
            }
        };

        report.record_progress(entry.clone(), attachments);
        self.store.save(report.clone()).map_err(store_error)?;
        self.audit.append(id, "progress", describe(&entry));

        tracing::info!(
            tracking_id = %id,
            from = %entry.from,
            to = %entry.to,
            photos = entry.attachments_added,
            "progress updated"
        );
        for warning in &warnings {
            tracing::warn!(tracking_id = %id, %warning, "update applied with warning");
        }
        for event in self.events_for(id, &entry) {
            self.events.publish(event);
        }

        Ok(UpdateOutcome { report, warnings })
    }

    /// Route a pending report to a department
    pub fn assign(
        &self,
        id: &TrackingId,
        department: Department,
        note: impl Into<String>,
    ) -> Result<UpdateOutcome, UpdateError> {
        self.apply_update(
            id,
            ProgressUpdate::new()
                .with_status(IssueStatus::Assigned)
                .assigning(department)
                .with_note(note),
        )
    }

    fn events_for(&self, id: &TrackingId, entry: &ProgressEntry) -> Vec<IssueEvent> {
        let mut events = Vec::new();
        if let Some(department) = entry.department {
            events.push(IssueEvent::Assigned {
                tracking_id: id.clone(),
                department,
            });
        }
        if entry.from != entry.to {
            events.push(IssueEvent::StatusChanged {
                tracking_id: id.clone(),
                from: entry.from,
                to: entry.to,
            });
        }
        if let Some(note) = &entry.note {
            events.push(IssueEvent::NoteAdded {
                tracking_id: id.clone(),
                note: note.clone(),
            });
        }
        if entry.attachments_added > 0 {
            events.push(IssueEvent::AttachmentsAdded {
                tracking_id: id.clone(),
                count: entry.attachments_added,
            });
        }
        events
    }
}

fn store_error(err: StoreError) -> UpdateError {
    match err {
        StoreError::NotFound(id) => UpdateError::NotFound(id),
        other => UpdateError::Store(other.to_string()),
    }
}

fn describe(entry: &ProgressEntry) -> String {
    let mut detail = format!("{} -> {}", entry.from.as_str(), entry.to.as_str());
    if let Some(dept) = entry.department {
        detail.push_str(&format!("; department {}", dept.as_str()));
    }
    if let Some(note) = &entry.note {
        detail.push_str(&format!("; note {note:?}"));
    }
    if entry.attachments_added > 0 {
        detail.push_str(&format!("; {} photo(s)", entry.attachments_added));
    }
    detail
}
