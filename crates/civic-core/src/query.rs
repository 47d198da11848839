//! Issue listing for the admin dashboard and map
//!
//! Filtering by status, urgency, department and free-text search, plus
//! per-status and per-department counts.

use crate::store::IssueReport;
use crate::types::{Department, IssueStatus, Urgency};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Dashboard filter; unset criteria match everything
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueFilter {
    pub status: Option<IssueStatus>,
    pub urgency: Option<Urgency>,
    pub department: Option<Department>,
    /// Case-insensitive match on id, type, location or description
    pub search: Option<String>,
}

impl IssueFilter {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: IssueStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = Some(urgency);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_department(mut self, department: Department) -> Self {
        self.department = Some(department);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    #[must_use]
    pub fn matches(&self, report: &IssueReport) -> bool {
        if self.status.is_some_and(|s| s != report.status()) {
            return false;
        }
        if self.urgency.is_some_and(|u| u != report.urgency()) {
            return false;
        }
        if self.department.is_some() && self.department != report.department() {
            return false;
        }

        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(text) => {
                let needle = text.to_lowercase();
                [
                    report.tracking_id().as_str().to_string(),
                    report.issue_type().label().to_string(),
                    report.location().to_string(),
                    report.description().to_string(),
                ]
                .iter()
                .any(|hay| hay.to_lowercase().contains(&needle))
            }
        }
    }

    /// Matching reports, order preserved
    #[must_use]
    pub fn apply(&self, reports: &[IssueReport]) -> Vec<IssueReport> {
        reports.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

/// Headline numbers for the dashboards
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total: usize,
    pub by_status: BTreeMap<IssueStatus, usize>,
    pub by_department: BTreeMap<Department, usize>,
    pub unassigned: usize,
    /// High urgency and not yet resolved
    pub open_high_urgency: usize,
}

impl DashboardStats {
    #[must_use]
    pub fn compute(reports: &[IssueReport]) -> Self {
        let mut stats = Self {
            total: reports.len(),
            ..Self::default()
        };

        for report in reports {
            *stats.by_status.entry(report.status()).or_default() += 1;
            match report.department() {
                Some(dept) => *stats.by_department.entry(dept).or_default() += 1,
                None => stats.unassigned += 1,
            }
            if report.urgency() == Urgency::High && !report.status().is_terminal() {
                stats.open_high_urgency += 1;
            }
        }

        stats
    }

    #[must_use]
    pub fn count(&self, status: IssueStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    /// Share of reports resolved, 0.0 when there are none
    #[must_use]
    pub fn resolution_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(IssueStatus::Resolved) as f64 / self.total as f64
    }
}
