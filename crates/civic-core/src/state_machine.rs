//! Report status transitions
//!
//! ```text
//! Pending -> Assigned -> InProgress -> Resolved
//!                          |    ^
//!                          v    |
//!               RequiresMaterials / OnHold
//! ```
//!
//! `Resolved` has no outgoing moves and nothing returns to `Pending`.

use crate::types::IssueStatus;

/// A status move outside the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal status transition {from} -> {to}")]
pub struct IllegalTransition {
    pub from: IssueStatus,
    pub to: IssueStatus,
}

/// Check a single move against the table
///
/// # Errors
/// `IllegalTransition` when `to` is not a successor of `from`.
pub fn validate_transition(from: IssueStatus, to: IssueStatus) -> Result<(), IllegalTransition> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(IllegalTransition { from, to })
    }
}

/// Statuses reachable from `from` in one move
#[must_use]
pub fn allowed_transitions(from: IssueStatus) -> &'static [IssueStatus] {
    use IssueStatus::{Assigned, InProgress, OnHold, Pending, RequiresMaterials, Resolved};

    match from {
        Pending => &[Assigned],
        Assigned => &[InProgress],
        InProgress => &[RequiresMaterials, OnHold, Resolved],
        RequiresMaterials | OnHold => &[InProgress],
        Resolved => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_move_names_both_ends() {
        let err = validate_transition(IssueStatus::Assigned, IssueStatus::Resolved).unwrap_err();
        assert_eq!(err.from, IssueStatus::Assigned);
        assert_eq!(err.to, IssueStatus::Resolved);
        assert!(err.to_string().starts_with("illegal status transition"));
    }
}
