//! Issue events for the presentation layer
//!
//! Engines publish after the corresponding change is stored, so a
//! subscriber that sees `Submitted` can already look the report up.

use crate::types::{Department, IssueStatus, TrackingId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Something observable happened to an issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum IssueEvent {
    /// A report was accepted and given its tracking id
    Submitted { tracking_id: TrackingId },
    /// Routed to a department
    Assigned {
        tracking_id: TrackingId,
        department: Department,
    },
    StatusChanged {
        tracking_id: TrackingId,
        from: IssueStatus,
        to: IssueStatus,
    },
    NoteAdded { tracking_id: TrackingId, note: String },
    AttachmentsAdded { tracking_id: TrackingId, count: usize },
}

impl IssueEvent {
    #[must_use]
    pub fn tracking_id(&self) -> &TrackingId {
        match self {
            IssueEvent::Submitted { tracking_id }
            | IssueEvent::Assigned { tracking_id, .. }
            | IssueEvent::StatusChanged { tracking_id, .. }
            | IssueEvent::NoteAdded { tracking_id, .. }
            | IssueEvent::AttachmentsAdded { tracking_id, .. } => tracking_id,
        }
    }

    /// Text for a confirmation toast
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            IssueEvent::Submitted { tracking_id } => format!(
                "Your report has been submitted and assigned a tracking number #{tracking_id}."
            ),
            IssueEvent::Assigned {
                tracking_id,
                department,
            } => format!("Issue #{tracking_id} assigned to {department}."),
            IssueEvent::StatusChanged { tracking_id, to, .. } => {
                format!("Issue #{tracking_id} is now {to}.")
            }
            IssueEvent::NoteAdded { tracking_id, .. } => {
                format!("Progress note added to #{tracking_id}.")
            }
            IssueEvent::AttachmentsAdded { tracking_id, count } => {
                format!("{count} photo(s) added to #{tracking_id}.")
            }
        }
    }
}

/// Fan-out of issue events
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<IssueEvent>,
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<IssueEvent> {
        self.sender.subscribe()
    }

    /// Deliver to current subscribers; returns how many received it
    pub fn publish(&self, event: IssueEvent) -> usize {
        tracing::debug!(tracking_id = %event.tracking_id(), ?event, "publishing event");
        // No subscribers is not an error
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
