//! Location resolver
//!
//! Wraps the environment's single-shot position query. A lookup never blocks
//! the form and is never retried; failures downgrade to manual address entry.
//! A result that arrives after its form was discarded, reset, or dropped is
//! ignored.

use crate::config::CivicConfig;
use crate::draft::{LocationTicket, ReportDraft};
use crate::error::LocationError;
use crate::types::Coordinates;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Draft shared between the form and in-flight lookups
pub type SharedDraft = Arc<Mutex<ReportDraft>>;

/// Environment-supplied position source
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    /// Query the current position once
    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// Provider for environments without a position API
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocation;

#[async_trait]
impl GeolocationProvider for NoGeolocation {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::Unavailable)
    }
}

/// Result of one lookup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum LocationOutcome {
    Success { latitude: f64, longitude: f64 },
    Failure { reason: LocationError },
}

impl LocationOutcome {
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        match *self {
            LocationOutcome::Success {
                latitude,
                longitude,
            } => Some(Coordinates::new(latitude, longitude)),
            LocationOutcome::Failure { .. } => None,
        }
    }

    /// Text for the confirmation or error toast
    #[must_use]
    pub fn message(&self) -> String {
        match self.coordinates() {
            Some(coords) => format!("Coordinates: {coords}"),
            None => "Unable to detect location. Please enter manually.".to_string(),
        }
    }
}

impl From<Result<Coordinates, LocationError>> for LocationOutcome {
    fn from(value: Result<Coordinates, LocationError>) -> Self {
        match value {
            Ok(c) => LocationOutcome::Success {
                latitude: c.latitude,
                longitude: c.longitude,
            },
            Err(reason) => LocationOutcome::Failure { reason },
        }
    }
}

/// What happened to a lookup result delivered to a draft
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationApplied {
    /// Coordinates stored on the draft
    Applied(Coordinates),
    /// Lookup failed; draft untouched
    Failed(LocationError),
    /// Draft gone or moved on; result dropped
    Stale,
}

/// Position lookup with a bounded wait
#[derive(Clone)]
pub struct LocationResolver {
    provider: Arc<dyn GeolocationProvider>,
    timeout: Duration,
}

impl std::fmt::Debug for LocationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationResolver")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl LocationResolver {
    #[must_use]
    pub fn new(provider: Arc<dyn GeolocationProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    #[must_use]
    pub fn from_config(provider: Arc<dyn GeolocationProvider>, config: &CivicConfig) -> Self {
        Self::new(provider, config.geolocation_timeout())
    }

    /// Query the provider once, mapping an overrun to `Timeout`
    pub async fn resolve_current_location(&self) -> LocationOutcome {
        let result = match tokio::time::timeout(self.timeout, self.provider.current_position()).await
        {
            Ok(result) => result,
            Err(_) => Err(LocationError::Timeout),
        };

        match &result {
            Ok(coords) => tracing::info!(%coords, "location detected"),
            Err(reason) => tracing::warn!(%reason, "location lookup failed"),
        }
        result.into()
    }

    /// Resolve in the background and deliver the result to `draft` if it is
    /// still waiting for it. The task holds only a weak reference, so a
    /// dropped form is never kept alive by a pending lookup.
    pub fn spawn_for(&self, draft: &SharedDraft) -> JoinHandle<LocationApplied> {
        let ticket: LocationTicket = draft.lock().begin_location_lookup();
        let weak = Arc::downgrade(draft);
        let resolver = self.clone();

        tokio::spawn(async move {
            let outcome = resolver.resolve_current_location().await;
            match weak.upgrade() {
                Some(draft) => draft.lock().apply_location(ticket, outcome),
                None => {
                    tracing::debug!("form dropped before location arrived");
                    LocationApplied::Stale
                }
            }
        })
    }
}
