use civic_core::state_machine::{allowed_transitions, validate_transition};
use civic_core::IssueStatus;
use proptest::prelude::*;
use std::collections::{BTreeSet, VecDeque};

fn any_status() -> impl Strategy<Value = IssueStatus> {
    prop_oneof![
        Just(IssueStatus::Pending),
        Just(IssueStatus::Assigned),
        Just(IssueStatus::InProgress),
        Just(IssueStatus::RequiresMaterials),
        Just(IssueStatus::OnHold),
        Just(IssueStatus::Resolved),
    ]
}

#[test]
fn test_pending_transitions() {
    assert!(validate_transition(IssueStatus::Pending, IssueStatus::Assigned).is_ok());

    assert!(validate_transition(IssueStatus::Pending, IssueStatus::InProgress).is_err());
    assert!(validate_transition(IssueStatus::Pending, IssueStatus::Resolved).is_err());
}

#[test]
fn test_in_progress_transitions() {
    assert!(validate_transition(IssueStatus::InProgress, IssueStatus::RequiresMaterials).is_ok());
    assert!(validate_transition(IssueStatus::InProgress, IssueStatus::OnHold).is_ok());
    assert!(validate_transition(IssueStatus::InProgress, IssueStatus::Resolved).is_ok());

    assert!(validate_transition(IssueStatus::InProgress, IssueStatus::Assigned).is_err());
    assert!(validate_transition(IssueStatus::InProgress, IssueStatus::Pending).is_err());
}

#[test]
fn test_paused_states_resume_work() {
    for paused in [IssueStatus::RequiresMaterials, IssueStatus::OnHold] {
        assert_eq!(allowed_transitions(paused), vec![IssueStatus::InProgress]);
        assert!(validate_transition(paused, IssueStatus::Resolved).is_err());
    }
}

#[test]
fn test_every_status_reachable_from_pending() {
    let mut seen = BTreeSet::from([IssueStatus::Pending]);
    let mut queue = VecDeque::from([IssueStatus::Pending]);
    while let Some(status) = queue.pop_front() {
        for &next in allowed_transitions(status) {
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    assert_eq!(seen.len(), IssueStatus::ALL.len());
}

proptest! {
    #[test]
    fn prop_all_transitions_are_subset_of_allowed(from in any_status(), to in any_status()) {
        let res = validate_transition(from, to);
        let allowed = allowed_transitions(from);

        if res.is_ok() {
            prop_assert!(allowed.contains(&to));
        } else {
            prop_assert!(!allowed.contains(&to));
        }
    }

    #[test]
    fn prop_resolved_is_final(to in any_status()) {
        prop_assert!(validate_transition(IssueStatus::Resolved, to).is_err());
    }

    #[test]
    fn prop_nothing_returns_to_pending(from in any_status()) {
        prop_assert!(validate_transition(from, IssueStatus::Pending).is_err());
    }

    #[test]
    fn prop_no_self_transitions(status in any_status()) {
        prop_assert!(validate_transition(status, status).is_err());
    }
}
