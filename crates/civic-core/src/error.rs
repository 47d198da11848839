//! Error types for the civic reporting core
//!
//! Errors fall into four groups:
//! - User-correctable input problems (`ValidationError`)
//! - Business-rule rejections on the update path (`UpdateError`)
//! - Caller bugs (`AttachmentError::OutOfRange`)
//! - Environment problems (`StoreError`, `ConfigError`)
//!
//! Location lookups fail with `LocationError`, which callers treat as a
//! graceful downgrade to manual entry rather than an error.

use crate::attachments::SkipReason;
use crate::types::{Field, IssueStatus, TrackingId};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Top-level error for the core
#[derive(Debug, thiserror::Error)]
pub enum CivicError {
    /// Report submission failed
    #[error("submission failed: {0}")]
    Submission(#[from] SubmissionError),

    /// Progress update rejected
    #[error("update rejected: {0}")]
    Update(#[from] UpdateError),

    /// Attachment operation misused
    #[error("attachment error: {0}")]
    Attachment(#[from] AttachmentError),

    /// Issue store failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl CivicError {
    /// The user can fix this by changing their input
    #[inline]
    #[must_use]
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::Submission(SubmissionError::Validation(_)) | Self::Update(_)
        )
    }

    /// Indicates a bug in the calling code rather than bad input
    #[inline]
    #[must_use]
    pub fn is_caller_bug(&self) -> bool {
        matches!(
            self,
            Self::Attachment(AttachmentError::OutOfRange { .. })
                | Self::Submission(SubmissionError::AlreadySubmitted(_))
                | Self::Submission(SubmissionError::Discarded)
        )
    }
}

/// Required fields were left empty
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing required fields: {}", join_fields(.missing_fields))]
pub struct ValidationError {
    /// Exactly the required fields that were empty
    pub missing_fields: BTreeSet<Field>,
}

impl ValidationError {
    #[must_use]
    pub fn new(missing_fields: BTreeSet<Field>) -> Self {
        Self { missing_fields }
    }

    #[inline]
    #[must_use]
    pub fn is_missing(&self, field: Field) -> bool {
        self.missing_fields.contains(&field)
    }
}

fn join_fields(fields: &BTreeSet<Field>) -> String {
    fields
        .iter()
        .map(Field::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Report submission errors
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    /// Required input missing; the draft stays editable
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The draft already produced a report
    #[error("draft already submitted as {0}")]
    AlreadySubmitted(TrackingId),

    /// The draft was discarded
    #[error("draft was discarded")]
    Discarded,

    /// The store refused the report
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Progress update rejections
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpdateError {
    /// No report with this id
    #[error("issue {0} not found")]
    NotFound(TrackingId),

    /// Resolved reports accept no further updates
    #[error("issue {0} is already resolved")]
    AlreadyResolved(TrackingId),

    /// Target status not reachable from the current one
    #[error("cannot move from {from} to {to}")]
    InvalidTransition { from: IssueStatus, to: IssueStatus },

    /// Payload would change nothing
    #[error("update changes nothing")]
    NoChange,

    /// Report already holds the maximum number of attachments
    #[error("attachment limit of {limit} reached, {dropped} image(s) not added")]
    AttachmentLimitReached { limit: usize, dropped: usize },

    /// Update photo failed the per-image checks and was not stored
    #[error("{file_name} not added: {reason}")]
    AttachmentSkipped { file_name: String, reason: SkipReason },

    /// Entering `Assigned` needs a department
    #[error("a department must be chosen before assigning")]
    DepartmentRequired,

    /// Store failure other than a missing report
    #[error("store error: {0}")]
    Store(String),
}

/// Attachment manager misuse
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttachmentError {
    /// Index not within `[0, len)`
    #[error("attachment index {index} out of range (len {len})")]
    OutOfRange { index: usize, len: usize },
}

/// Issue store errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("issue {0} not found")]
    NotFound(TrackingId),

    #[error("issue {0} already exists")]
    Duplicate(TrackingId),
}

/// Audit trail damage
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuditError {
    #[error("audit chain broken at record {sequence}")]
    IntegrityViolation { sequence: u64 },
}

/// Why a device position could not be obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location unavailable")]
    Unavailable,

    #[error("location lookup timed out")]
    Timeout,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Selection value or identifier could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid tracking id: {0}")]
    TrackingId(String),

    #[error("unknown issue type: {0}")]
    IssueType(String),

    #[error("unknown urgency: {0}")]
    Urgency(String),

    #[error("unknown status: {0}")]
    Status(String),

    #[error("unknown department: {0}")]
    Department(String),
}
