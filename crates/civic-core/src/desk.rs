//! Civic desk
//!
//! The entry point the presentation layer talks to. Owns the configuration,
//! the issue store, the preview registry, the event bus and the audit trail,
//! and wires them into the submission and progress engines.

use crate::attachments::AttachmentLimits;
use crate::audit::AuditLog;
use crate::config::CivicConfig;
use crate::dialog::UpdateDialog;
use crate::draft::ReportDraft;
use crate::error::{StoreError, SubmissionError, UpdateError};
use crate::events::{EventBus, IssueEvent};
use crate::location::{GeolocationProvider, LocationResolver, NoGeolocation, SharedDraft};
use crate::preview::PreviewRegistry;
use crate::progress::{ProgressEngine, ProgressUpdate, UpdateOutcome};
use crate::query::{DashboardStats, IssueFilter};
use crate::store::{InMemoryIssueStore, IssueReport, IssueStore};
use crate::submission::{SubmissionEngine, SubmissionReceipt};
use crate::types::{Department, TrackingId};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Wires the workflows together
#[derive(Debug)]
pub struct CivicDesk {
    config: CivicConfig,
    store: Arc<dyn IssueStore>,
    previews: PreviewRegistry,
    events: EventBus,
    audit: Arc<AuditLog>,
    submission: SubmissionEngine,
    progress: ProgressEngine,
    resolver: LocationResolver,
}

impl CivicDesk {
    /// Create a desk over the given collaborators
    #[must_use]
    pub fn new(
        config: CivicConfig,
        store: Arc<dyn IssueStore>,
        geolocation: Arc<dyn GeolocationProvider>,
    ) -> Self {
        let events = EventBus::new(config.event_channel_capacity);
        let audit = Arc::new(AuditLog::new());

        Self {
            submission: SubmissionEngine::new(store.clone(), events.clone(), audit.clone()),
            progress: ProgressEngine::new(
                store.clone(),
                events.clone(),
                audit.clone(),
                AttachmentLimits::from_config(&config),
            ),
            resolver: LocationResolver::from_config(geolocation, &config),
            previews: PreviewRegistry::new(),
            config,
            store,
            events,
            audit,
        }
    }

    /// In-memory store, no position source
    #[must_use]
    pub fn in_memory(config: CivicConfig) -> Self {
        let store = Arc::new(InMemoryIssueStore::new(&config));
        Self::new(config, store, Arc::new(NoGeolocation))
    }

    // Report workflow

    /// Empty report form
    #[must_use]
    pub fn new_draft(&self) -> ReportDraft {
        ReportDraft::new(self.previews.clone(), &self.config)
    }

    /// Empty report form that background location lookups can reach
    #[must_use]
    pub fn new_shared_draft(&self) -> SharedDraft {
        Arc::new(Mutex::new(self.new_draft()))
    }

    pub fn submit(&self, draft: &mut ReportDraft) -> Result<SubmissionReceipt, SubmissionError> {
        self.submission.submit(draft)
    }

    #[inline]
    #[must_use]
    pub fn location_resolver(&self) -> &LocationResolver {
        &self.resolver
    }

    // Department workflow

    pub fn apply_update(
        &self,
        id: &TrackingId,
        update: ProgressUpdate,
    ) -> Result<UpdateOutcome, UpdateError> {
        self.progress.apply_update(id, update)
    }

    pub fn assign(
        &self,
        id: &TrackingId,
        department: Department,
        note: impl Into<String>,
    ) -> Result<UpdateOutcome, UpdateError> {
        self.progress.assign(id, department, note)
    }

    /// Open the update dialog for an issue
    pub fn open_update_dialog(&self, dialog: &mut UpdateDialog, id: TrackingId) {
        dialog.open(id, self.previews.clone(), &self.config);
    }

    /// Confirm the dialog's edits
    pub fn confirm_update_dialog(
        &self,
        dialog: &mut UpdateDialog,
    ) -> Option<Result<UpdateOutcome, UpdateError>> {
        dialog.confirm(&self.progress)
    }

    // Admin views

    pub fn issue(&self, id: &TrackingId) -> Result<IssueReport, UpdateError> {
        self.store.get(id).map_err(|err| match err {
            StoreError::NotFound(id) => UpdateError::NotFound(id),
            other => UpdateError::Store(other.to_string()),
        })
    }

    #[must_use]
    pub fn issues(&self, filter: &IssueFilter) -> Vec<IssueReport> {
        filter.apply(&self.store.list())
    }

    #[must_use]
    pub fn stats(&self) -> DashboardStats {
        DashboardStats::compute(&self.store.list())
    }

    // Plumbing

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<IssueEvent> {
        self.events.subscribe()
    }

    #[inline]
    #[must_use]
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    #[inline]
    #[must_use]
    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &CivicConfig {
        &self.config
    }
}
