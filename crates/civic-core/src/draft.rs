//! Report draft (field store)
//!
//! Holds what the citizen has entered so far. Setters never reject input;
//! an empty string is a perfectly valid intermediate value while typing.
//! Required-field checks happen only at submission.

use crate::attachments::{AttachmentLimits, AttachmentManager};
use crate::config::CivicConfig;
use crate::error::ValidationError;
use crate::location::{LocationApplied, LocationOutcome};
use crate::preview::PreviewRegistry;
use crate::types::{Contact, Coordinates, Field, IssueType, Location, TrackingId, Urgency};
use std::collections::BTreeSet;

/// Where a draft is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftState {
    /// Accepting input
    Editing,
    /// Became the report with this id; terminal
    Submitted(TrackingId),
    /// Abandoned; terminal
    Discarded,
}

/// Proof that a location lookup was requested for the current draft epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationTicket {
    epoch: u64,
}

/// Citizen-facing report form state
#[derive(Debug)]
pub struct ReportDraft {
    issue_type: Option<IssueType>,
    urgency: Option<Urgency>,
    location_text: String,
    coordinates: Option<Coordinates>,
    description: String,
    contact_name: String,
    contact_email: String,
    attachments: AttachmentManager,
    recording: bool,
    state: DraftState,
    rejection: Option<ValidationError>,
    epoch: u64,
}

impl ReportDraft {
    /// Empty draft
    #[must_use]
    pub fn new(registry: PreviewRegistry, config: &CivicConfig) -> Self {
        Self {
            issue_type: None,
            urgency: None,
            location_text: String::new(),
            coordinates: None,
            description: String::new(),
            contact_name: String::new(),
            contact_email: String::new(),
            attachments: AttachmentManager::new(registry, AttachmentLimits::from_config(config)),
            recording: false,
            state: DraftState::Editing,
            rejection: None,
            epoch: 0,
        }
    }

    // Field setters

    pub fn set_issue_type(&mut self, issue_type: Option<IssueType>) {
        self.issue_type = issue_type;
        self.touch(Field::IssueType);
    }

    pub fn set_urgency(&mut self, urgency: Option<Urgency>) {
        self.urgency = urgency;
        self.touch(Field::Urgency);
    }

    pub fn set_location_text(&mut self, text: impl Into<String>) {
        self.location_text = text.into();
        self.touch(Field::Location);
    }

    pub fn set_coordinates(&mut self, coordinates: Option<Coordinates>) {
        self.coordinates = coordinates;
        self.touch(Field::Location);
    }

    pub fn set_description(&mut self, text: impl Into<String>) {
        self.description = text.into();
        self.touch(Field::Description);
    }

    pub fn set_contact_name(&mut self, name: impl Into<String>) {
        self.contact_name = name.into();
    }

    pub fn set_contact_email(&mut self, email: impl Into<String>) {
        self.contact_email = email.into();
    }

    // Field getters

    #[inline]
    #[must_use]
    pub fn issue_type(&self) -> Option<IssueType> {
        self.issue_type
    }

    #[inline]
    #[must_use]
    pub fn urgency(&self) -> Option<Urgency> {
        self.urgency
    }

    #[inline]
    #[must_use]
    pub fn location_text(&self) -> &str {
        &self.location_text
    }

    #[inline]
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[inline]
    #[must_use]
    pub fn contact_name(&self) -> &str {
        &self.contact_name
    }

    #[inline]
    #[must_use]
    pub fn contact_email(&self) -> &str {
        &self.contact_email
    }

    #[inline]
    #[must_use]
    pub fn attachments(&self) -> &AttachmentManager {
        &self.attachments
    }

    #[inline]
    pub fn attachments_mut(&mut self) -> &mut AttachmentManager {
        &mut self.attachments
    }

    /// Typed address and resolved position, blanks dropped
    #[must_use]
    pub fn location(&self) -> Location {
        let address = self.location_text.trim();
        Location {
            address: (!address.is_empty()).then(|| address.to_string()),
            coordinates: self.coordinates,
        }
    }

    /// Contact details, blanks dropped
    #[must_use]
    pub fn contact(&self) -> Contact {
        let present = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };
        Contact {
            name: present(&self.contact_name),
            email: present(&self.contact_email),
        }
    }

    // Voice description

    #[inline]
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Start or stop voice capture; returns the new state
    pub fn toggle_recording(&mut self) -> bool {
        self.recording = !self.recording;
        tracing::debug!(recording = self.recording, "voice capture toggled");
        self.recording
    }

    /// Append recognized speech to the description while recording.
    /// Returns whether the fragment was used.
    pub fn append_transcript(&mut self, fragment: &str) -> bool {
        let fragment = fragment.trim();
        if !self.recording || fragment.is_empty() {
            return false;
        }
        if !self.description.is_empty() && !self.description.ends_with(char::is_whitespace) {
            self.description.push(' ');
        }
        self.description.push_str(fragment);
        self.touch(Field::Description);
        true
    }

    // Validation

    /// Required fields that are currently empty
    #[must_use]
    pub fn missing_fields(&self) -> BTreeSet<Field> {
        let mut missing = BTreeSet::new();
        if self.issue_type.is_none() {
            missing.insert(Field::IssueType);
        }
        if self.urgency.is_none() {
            missing.insert(Field::Urgency);
        }
        if self.location().is_empty() {
            missing.insert(Field::Location);
        }
        if self.description.trim().is_empty() {
            missing.insert(Field::Description);
        }
        missing
    }

    /// Errors from the last rejected submission still unresolved
    #[inline]
    #[must_use]
    pub fn rejection(&self) -> Option<&ValidationError> {
        self.rejection.as_ref()
    }

    // Lifecycle

    #[inline]
    #[must_use]
    pub fn state(&self) -> &DraftState {
        &self.state
    }

    #[inline]
    #[must_use]
    pub fn is_editing(&self) -> bool {
        self.state == DraftState::Editing
    }

    /// Abandon the draft, revoking every preview. Pending lookups become stale.
    pub fn discard(&mut self) {
        self.attachments.clear();
        self.recording = false;
        self.epoch += 1;
        self.state = DraftState::Discarded;
        tracing::debug!("report draft discarded");
    }

    /// Clear all input and start over
    pub fn reset(&mut self) {
        self.issue_type = None;
        self.urgency = None;
        self.location_text.clear();
        self.coordinates = None;
        self.description.clear();
        self.contact_name.clear();
        self.contact_email.clear();
        self.attachments.clear();
        self.recording = false;
        self.rejection = None;
        self.epoch += 1;
        self.state = DraftState::Editing;
    }

    /// Mark a location lookup as in flight
    #[must_use]
    pub fn begin_location_lookup(&self) -> LocationTicket {
        LocationTicket { epoch: self.epoch }
    }

    /// Deliver a lookup result. Ignored when the draft has been discarded,
    /// reset, or submitted since the ticket was issued.
    pub fn apply_location(&mut self, ticket: LocationTicket, outcome: LocationOutcome) -> LocationApplied {
        if ticket.epoch != self.epoch || !self.is_editing() {
            tracing::debug!("ignoring stale location result");
            return LocationApplied::Stale;
        }

        match outcome {
            LocationOutcome::Success {
                latitude,
                longitude,
            } => {
                let coords = Coordinates::new(latitude, longitude);
                self.set_coordinates(Some(coords));
                LocationApplied::Applied(coords)
            }
            LocationOutcome::Failure { reason } => LocationApplied::Failed(reason),
        }
    }

    pub(crate) fn record_rejection(&mut self, error: ValidationError) {
        self.rejection = Some(error);
    }

    pub(crate) fn mark_submitted(&mut self, tracking_id: TrackingId) {
        self.recording = false;
        self.rejection = None;
        self.epoch += 1;
        self.state = DraftState::Submitted(tracking_id);
    }

    /// A field changed; drop it from the outstanding rejection once filled
    fn touch(&mut self, field: Field) {
        let filled = !self.missing_fields().contains(&field);
        if let Some(rejection) = self.rejection.as_mut() {
            if filled {
                rejection.missing_fields.remove(&field);
            }
            if rejection.missing_fields.is_empty() {
                self.rejection = None;
            }
        }
    }
}
