//! Testing utilities for the civic report workspace
//!
//! Shared fixtures: image blobs, filled drafts, scripted position sources,
//! and a desk with a report already moved to a given status.

#![allow(missing_docs)]

use async_trait::async_trait;
use civic_core::{
    CivicConfig, CivicDesk, Coordinates, Department, GeolocationProvider, ImageBlob,
    InMemoryIssueStore, IssueStatus, IssueType, LocationError, ProgressUpdate, ReportDraft,
    TrackingId, Urgency,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

pub fn jpeg(name: &str) -> ImageBlob {
    ImageBlob::new(name, "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0])
}

pub fn jpegs(names: &[&str]) -> Vec<ImageBlob> {
    names.iter().map(|n| jpeg(n)).collect()
}

/// Fill every required field with the pothole scenario values
pub fn fill_pothole(draft: &mut ReportDraft) {
    draft.set_issue_type(Some(IssueType::Pothole));
    draft.set_urgency(Some(Urgency::High));
    draft.set_location_text("Main St");
    draft.set_description("Large hole");
}

pub fn filled_draft(desk: &CivicDesk) -> ReportDraft {
    let mut draft = desk.new_draft();
    fill_pothole(&mut draft);
    draft
}

pub fn setup_desk() -> CivicDesk {
    CivicDesk::in_memory(CivicConfig::default())
}

pub fn setup_desk_with(geolocation: Arc<dyn GeolocationProvider>) -> CivicDesk {
    setup_desk_with_config(CivicConfig::default(), geolocation)
}

pub fn setup_desk_with_config(
    config: CivicConfig,
    geolocation: Arc<dyn GeolocationProvider>,
) -> CivicDesk {
    let store = Arc::new(InMemoryIssueStore::new(&config));
    CivicDesk::new(config, store, geolocation)
}

/// Submit a pothole report and return its id
pub fn submit_pothole(desk: &CivicDesk) -> TrackingId {
    let mut draft = filled_draft(desk);
    desk.submit(&mut draft).unwrap().tracking_id
}

/// Submit a pothole report and walk it to `status` along the usual path
pub fn report_in_status(desk: &CivicDesk, status: IssueStatus) -> TrackingId {
    use IssueStatus::{Assigned, InProgress};

    let id = submit_pothole(desk);
    let path: &[IssueStatus] = match status {
        IssueStatus::Pending => &[],
        Assigned => &[Assigned],
        InProgress => &[Assigned, InProgress],
        IssueStatus::RequiresMaterials => &[Assigned, InProgress, IssueStatus::RequiresMaterials],
        IssueStatus::OnHold => &[Assigned, InProgress, IssueStatus::OnHold],
        IssueStatus::Resolved => &[Assigned, InProgress, IssueStatus::Resolved],
    };

    for &step in path {
        let mut update = ProgressUpdate::new().with_status(step);
        if step == Assigned {
            update = update.assigning(Department::StreetMaintenance);
        }
        desk.apply_update(&id, update).unwrap();
    }
    id
}

/// Position source that always answers the same way
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocation(pub Result<Coordinates, LocationError>);

impl FixedGeolocation {
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self(Ok(Coordinates::new(latitude, longitude)))
    }

    pub fn failing(reason: LocationError) -> Self {
        Self(Err(reason))
    }
}

#[async_trait]
impl GeolocationProvider for FixedGeolocation {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        self.0
    }
}

/// Position source that answers only when released, one answer per call
#[derive(Debug, Default)]
pub struct GatedGeolocation {
    answers: Mutex<VecDeque<Result<Coordinates, LocationError>>>,
    gate: Notify,
}

impl GatedGeolocation {
    pub fn new(answers: impl IntoIterator<Item = Result<Coordinates, LocationError>>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            gate: Notify::new(),
        }
    }

    /// Let one pending lookup complete
    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl GeolocationProvider for GatedGeolocation {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        self.gate.notified().await;
        self.answers
            .lock()
            .pop_front()
            .unwrap_or(Err(LocationError::Unavailable))
    }
}

/// Position source that takes `delay` before answering
#[derive(Debug, Clone, Copy)]
pub struct SlowGeolocation {
    pub delay: Duration,
    pub coordinates: Coordinates,
}

#[async_trait]
impl GeolocationProvider for SlowGeolocation {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.coordinates)
    }
}
