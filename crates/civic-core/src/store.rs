//! Issue store
//!
//! The persistence seam. Engines talk to an [`IssueStore`]; the store owns
//! tracking-id allocation. [`InMemoryIssueStore`] hands out sequential
//! `YYYY-NNNN` ids per reporting year and keeps everything in memory.

use crate::attachments::ImageBlob;
use crate::config::CivicConfig;
use crate::error::StoreError;
use crate::types::{Contact, Department, IssueStatus, IssueType, Location, TrackingId, Urgency};
use chrono::{DateTime, Datelike, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Validated report contents awaiting a tracking id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIssue {
    pub issue_type: IssueType,
    pub urgency: Urgency,
    pub location: Location,
    pub description: String,
    pub contact: Contact,
    pub attachments: Vec<ImageBlob>,
    pub created_at: DateTime<Utc>,
}

/// One accepted progress update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub at: DateTime<Utc>,
    pub from: IssueStatus,
    pub to: IssueStatus,
    pub note: Option<String>,
    pub department: Option<Department>,
    pub attachments_added: usize,
}

/// A submitted report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueReport {
    tracking_id: TrackingId,
    issue_type: IssueType,
    urgency: Urgency,
    location: Location,
    description: String,
    contact: Contact,
    attachments: Vec<ImageBlob>,
    status: IssueStatus,
    department: Option<Department>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    progress_log: Vec<ProgressEntry>,
}

impl IssueReport {
    /// Fresh `Pending` report
    #[must_use]
    pub fn new(tracking_id: TrackingId, issue: NewIssue) -> Self {
        Self {
            tracking_id,
            issue_type: issue.issue_type,
            urgency: issue.urgency,
            location: issue.location,
            description: issue.description,
            contact: issue.contact,
            attachments: issue.attachments,
            status: IssueStatus::Pending,
            department: None,
            created_at: issue.created_at,
            updated_at: issue.created_at,
            progress_log: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn tracking_id(&self) -> &TrackingId {
        &self.tracking_id
    }

    #[inline]
    #[must_use]
    pub fn issue_type(&self) -> IssueType {
        self.issue_type
    }

    #[inline]
    #[must_use]
    pub fn urgency(&self) -> Urgency {
        self.urgency
    }

    #[inline]
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[inline]
    #[must_use]
    pub fn contact(&self) -> &Contact {
        &self.contact
    }

    #[inline]
    #[must_use]
    pub fn attachments(&self) -> &[ImageBlob] {
        &self.attachments
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> IssueStatus {
        self.status
    }

    #[inline]
    #[must_use]
    pub fn department(&self) -> Option<Department> {
        self.department
    }

    #[inline]
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Accepted updates, oldest first
    #[inline]
    #[must_use]
    pub fn progress_log(&self) -> &[ProgressEntry] {
        &self.progress_log
    }

    /// Notes from the progress log, oldest first
    pub fn notes(&self) -> impl Iterator<Item = &str> {
        self.progress_log.iter().filter_map(|e| e.note.as_deref())
    }

    /// Apply an already-validated update
    pub(crate) fn record_progress(&mut self, entry: ProgressEntry, attachments: Vec<ImageBlob>) {
        self.status = entry.to;
        if entry.department.is_some() {
            self.department = entry.department;
        }
        self.attachments.extend(attachments);
        self.updated_at = entry.at;
        self.progress_log.push(entry);
    }
}

/// Persistence collaborator
pub trait IssueStore: Send + Sync {
    /// Allocate a tracking id and store the report
    fn create(&self, issue: NewIssue) -> Result<IssueReport, StoreError>;

    fn get(&self, id: &TrackingId) -> Result<IssueReport, StoreError>;

    /// Replace an existing report
    fn save(&self, report: IssueReport) -> Result<(), StoreError>;

    /// All reports ordered by tracking id
    fn list(&self) -> Vec<IssueReport>;
}

impl std::fmt::Debug for dyn IssueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("IssueStore")
    }
}

/// Process-local store
#[derive(Debug)]
pub struct InMemoryIssueStore {
    issues: RwLock<BTreeMap<TrackingId, IssueReport>>,
    next_sequence: Mutex<HashMap<i32, u32>>,
    first_sequence: u32,
}

impl InMemoryIssueStore {
    #[must_use]
    pub fn new(config: &CivicConfig) -> Self {
        Self {
            issues: RwLock::new(BTreeMap::new()),
            next_sequence: Mutex::new(HashMap::new()),
            first_sequence: config.first_tracking_sequence,
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.read().len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.read().is_empty()
    }

    fn allocate(&self, year: i32) -> TrackingId {
        let mut sequences = self.next_sequence.lock();
        let next = sequences.entry(year).or_insert(self.first_sequence);
        let id = TrackingId::new(year, *next);
        *next += 1;
        id
    }
}

impl Default for InMemoryIssueStore {
    fn default() -> Self {
        Self::new(&CivicConfig::default())
    }
}

impl IssueStore for InMemoryIssueStore {
    fn create(&self, issue: NewIssue) -> Result<IssueReport, StoreError> {
        let id = self.allocate(issue.created_at.year());
        let mut issues = self.issues.write();
        if issues.contains_key(&id) {
            return Err(StoreError::Duplicate(id));
        }

        let report = IssueReport::new(id.clone(), issue);
        issues.insert(id, report.clone());
        Ok(report)
    }

    fn get(&self, id: &TrackingId) -> Result<IssueReport, StoreError> {
        self.issues
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn save(&self, report: IssueReport) -> Result<(), StoreError> {
        let mut issues = self.issues.write();
        match issues.get_mut(report.tracking_id()) {
            Some(slot) => {
                *slot = report;
                Ok(())
            }
            None => Err(StoreError::NotFound(report.tracking_id.clone())),
        }
    }

    fn list(&self) -> Vec<IssueReport> {
        self.issues.read().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn new_issue(year: i32) -> NewIssue {
        NewIssue {
            issue_type: IssueType::Pothole,
            urgency: Urgency::High,
            location: Location::address("Main St"),
            description: "Large hole".into(),
            contact: Contact::default(),
            attachments: Vec::new(),
            created_at: Utc.with_ymd_and_hms(year, 1, 15, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn sequential_ids_per_year() {
        let store = InMemoryIssueStore::default();
        let a = store.create(new_issue(2024)).unwrap();
        let b = store.create(new_issue(2024)).unwrap();
        let c = store.create(new_issue(2025)).unwrap();

        assert_eq!(a.tracking_id().as_str(), "2024-0001");
        assert_eq!(b.tracking_id().as_str(), "2024-0002");
        assert_eq!(c.tracking_id().as_str(), "2025-0001");
        assert_eq!(a.status(), IssueStatus::Pending);
    }

    #[test]
    fn configured_first_sequence() {
        let store = InMemoryIssueStore::new(&CivicConfig::new().with_first_tracking_sequence(156));
        let a = store.create(new_issue(2024)).unwrap();
        assert_eq!(a.tracking_id().as_str(), "2024-0156");
    }

    #[test]
    fn get_unknown_is_not_found() {
        let store = InMemoryIssueStore::default();
        let id = TrackingId::new(2024, 9);
        assert_eq!(store.get(&id), Err(StoreError::NotFound(id)));
    }

    #[test]
    fn save_requires_existing() {
        let store = InMemoryIssueStore::default();
        let report = IssueReport::new(TrackingId::new(2024, 1), new_issue(2024));
        assert!(matches!(store.save(report), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn list_is_ordered() {
        let store = InMemoryIssueStore::default();
        for _ in 0..3 {
            store.create(new_issue(2024)).unwrap();
        }
        let ids: Vec<_> = store.list().iter().map(|r| r.tracking_id().to_string()).collect();
        assert_eq!(ids, ["2024-0001", "2024-0002", "2024-0003"]);
        assert_eq!(store.len(), 3);
    }
}
