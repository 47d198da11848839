use civic_core::{
    CivicConfig, CivicDesk, Department, InMemoryIssueStore, IssueEvent, IssueReport, IssueStatus,
    IssueStore, NewIssue, NoGeolocation, ProgressUpdate, StoreError, TrackingId, UpdateDialog,
    UpdateError,
};
use civic_test_utils::{jpeg, jpegs, report_in_status, setup_desk, submit_pothole};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

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

fn any_department() -> impl Strategy<Value = Department> {
    prop_oneof![
        Just(Department::StreetMaintenance),
        Just(Department::Sanitation),
        Just(Department::PublicWorks),
        Just(Department::ParksAndRecreation),
        Just(Department::TrafficManagement),
    ]
}

#[test]
fn completed_from_in_progress_resolves_with_note() {
    let desk = setup_desk();
    let id = report_in_status(&desk, IssueStatus::InProgress);

    let status: IssueStatus = "completed".parse().unwrap();
    let outcome = desk
        .apply_update(
            &id,
            ProgressUpdate::new()
                .with_status(status)
                .with_note("Pothole filled"),
        )
        .unwrap();

    assert_eq!(outcome.report.status(), IssueStatus::Resolved);
    assert!(outcome.warnings.is_empty());
    let last = outcome.report.progress_log().last().unwrap();
    assert_eq!(last.from, IssueStatus::InProgress);
    assert_eq!(last.to, IssueStatus::Resolved);
    assert_eq!(last.note.as_deref(), Some("Pothole filled"));
    assert_eq!(desk.issue(&id).unwrap(), outcome.report);
}

#[test]
fn same_status_without_content_is_no_change() {
    let desk = setup_desk();
    let id = report_in_status(&desk, IssueStatus::InProgress);
    let before = desk.issue(&id).unwrap();

    let err = desk
        .apply_update(
            &id,
            ProgressUpdate::new()
                .with_status(IssueStatus::InProgress)
                .with_note("   "),
        )
        .unwrap_err();

    assert_eq!(err, UpdateError::NoChange);
    assert_eq!(desk.issue(&id).unwrap(), before);
}

#[test]
fn repeated_empty_update_is_no_change() {
    let desk = setup_desk();
    let id = report_in_status(&desk, IssueStatus::InProgress);
    let before = desk.issue(&id).unwrap();
    let update = ProgressUpdate::new().with_status(IssueStatus::InProgress);

    for _ in 0..2 {
        let err = desk.apply_update(&id, update.clone()).unwrap_err();
        assert_eq!(err, UpdateError::NoChange);
    }
    assert_eq!(desk.issue(&id).unwrap(), before);
    assert_eq!(desk.audit().records_for(&id).len(), 3);
}

#[test]
fn update_needs_status_or_note() {
    let desk = setup_desk();
    let id = report_in_status(&desk, IssueStatus::InProgress);
    let before = desk.issue(&id).unwrap();

    let err = desk.apply_update(&id, ProgressUpdate::new()).unwrap_err();

    assert_eq!(
        err,
        UpdateError::InvalidTransition {
            from: IssueStatus::InProgress,
            to: IssueStatus::InProgress
        }
    );
    assert_eq!(desk.issue(&id).unwrap(), before);

    let outcome = desk
        .apply_update(&id, ProgressUpdate::new().with_note("Waiting on asphalt"))
        .unwrap();
    assert_eq!(outcome.report.status(), IssueStatus::InProgress);
}

#[test]
fn same_status_with_note_is_logged() {
    let desk = setup_desk();
    let id = report_in_status(&desk, IssueStatus::InProgress);

    let outcome = desk
        .apply_update(
            &id,
            ProgressUpdate::new()
                .with_status(IssueStatus::InProgress)
                .with_note("Half the lane patched"),
        )
        .unwrap();

    assert_eq!(outcome.report.status(), IssueStatus::InProgress);
    assert_eq!(
        outcome.report.notes().last(),
        Some("Half the lane patched")
    );
}

#[test]
fn full_lifecycle_with_pause() {
    let desk = setup_desk();
    let id = submit_pothole(&desk);

    desk.assign(&id, Department::StreetMaintenance, "Routed to roads crew")
        .unwrap();
    for status in [
        IssueStatus::InProgress,
        IssueStatus::RequiresMaterials,
        IssueStatus::InProgress,
        IssueStatus::OnHold,
        IssueStatus::InProgress,
        IssueStatus::Resolved,
    ] {
        desk.apply_update(&id, ProgressUpdate::new().with_status(status))
            .unwrap();
    }

    let report = desk.issue(&id).unwrap();
    let path: Vec<_> = report.progress_log().iter().map(|e| e.to).collect();
    assert_eq!(
        path,
        [
            IssueStatus::Assigned,
            IssueStatus::InProgress,
            IssueStatus::RequiresMaterials,
            IssueStatus::InProgress,
            IssueStatus::OnHold,
            IssueStatus::InProgress,
            IssueStatus::Resolved,
        ]
    );
    assert_eq!(report.notes().collect::<Vec<_>>(), ["Routed to roads crew"]);
    assert_eq!(desk.audit().records_for(&id).len(), 8);
    assert!(desk.audit().verify_integrity().is_ok());
}

#[test]
fn photos_capped_across_updates() {
    let desk = setup_desk();
    let id = report_in_status(&desk, IssueStatus::InProgress);

    desk.apply_update(
        &id,
        ProgressUpdate::new()
            .with_status(IssueStatus::InProgress)
            .with_attachments(jpegs(&["a.jpg", "b.jpg"])),
    )
    .unwrap();
    let outcome = desk
        .apply_update(
            &id,
            ProgressUpdate::new()
                .with_note("After patching")
                .with_attachments(jpegs(&["c.jpg", "d.jpg"])),
        )
        .unwrap();

    assert_eq!(outcome.report.attachments().len(), 3);
    assert_eq!(
        outcome.warnings,
        [UpdateError::AttachmentLimitReached {
            limit: 3,
            dropped: 1
        }]
    );

    let err = desk
        .apply_update(
            &id,
            ProgressUpdate::new()
                .with_status(IssueStatus::InProgress)
                .with_attachments(vec![jpeg("e.jpg")]),
        )
        .unwrap_err();
    assert_eq!(
        err,
        UpdateError::AttachmentLimitReached {
            limit: 3,
            dropped: 1
        }
    );
}

#[test]
fn assignment_publishes_events_in_order() {
    let desk = setup_desk();
    let id = submit_pothole(&desk);
    let mut events = desk.subscribe();

    desk.assign(&id, Department::PublicWorks, "Needs a crew").unwrap();

    assert_eq!(
        events.try_recv().unwrap(),
        IssueEvent::Assigned {
            tracking_id: id.clone(),
            department: Department::PublicWorks
        }
    );
    assert_eq!(
        events.try_recv().unwrap(),
        IssueEvent::StatusChanged {
            tracking_id: id.clone(),
            from: IssueStatus::Pending,
            to: IssueStatus::Assigned
        }
    );
    assert_eq!(
        events.try_recv().unwrap(),
        IssueEvent::NoteAdded {
            tracking_id: id,
            note: "Needs a crew".into()
        }
    );
    assert!(events.try_recv().is_err());
}

#[test]
fn dialog_stays_open_on_rejection() {
    let desk = setup_desk();
    let id = report_in_status(&desk, IssueStatus::Assigned);
    let mut dialog = UpdateDialog::default();

    desk.open_update_dialog(&mut dialog, id.clone());
    let draft = dialog.draft_mut().unwrap();
    draft.select_status(Some(IssueStatus::Resolved));
    draft.set_note("Done");
    draft.photos_mut().add_images(vec![jpeg("after.jpg")]);

    let result = desk.confirm_update_dialog(&mut dialog).unwrap();
    assert_eq!(
        result.unwrap_err(),
        UpdateError::InvalidTransition {
            from: IssueStatus::Assigned,
            to: IssueStatus::Resolved
        }
    );
    assert!(dialog.is_open());
    assert_eq!(desk.previews().live_count(), 1);

    dialog.draft_mut().unwrap().select_status(Some(IssueStatus::InProgress));
    let outcome = desk.confirm_update_dialog(&mut dialog).unwrap().unwrap();
    assert_eq!(outcome.report.status(), IssueStatus::InProgress);
    assert_eq!(outcome.report.attachments().len(), 1);
    assert!(!dialog.is_open());
    assert_eq!(desk.previews().live_count(), 0);
    assert!(desk.confirm_update_dialog(&mut dialog).is_none());
}

/// Store whose reads stall, widening the window between read and write
struct SlowReadStore {
    inner: InMemoryIssueStore,
    delay: Duration,
}

impl IssueStore for SlowReadStore {
    fn create(&self, issue: NewIssue) -> Result<IssueReport, StoreError> {
        self.inner.create(issue)
    }

    fn get(&self, id: &TrackingId) -> Result<IssueReport, StoreError> {
        thread::sleep(self.delay);
        self.inner.get(id)
    }

    fn save(&self, report: IssueReport) -> Result<(), StoreError> {
        self.inner.save(report)
    }

    fn list(&self) -> Vec<IssueReport> {
        self.inner.list()
    }
}

#[test]
fn concurrent_updates_do_not_overwrite_each_other() {
    let store = Arc::new(SlowReadStore {
        inner: InMemoryIssueStore::default(),
        delay: Duration::from_millis(20),
    });
    let desk = CivicDesk::new(CivicConfig::default(), store, Arc::new(NoGeolocation));
    let id = report_in_status(&desk, IssueStatus::InProgress);

    let (resolved, paused) = thread::scope(|scope| {
        let resolve = scope.spawn(|| {
            desk.apply_update(
                &id,
                ProgressUpdate::new()
                    .with_status(IssueStatus::Resolved)
                    .with_note("done"),
            )
        });
        let pause = scope.spawn(|| {
            desk.apply_update(
                &id,
                ProgressUpdate::new()
                    .with_status(IssueStatus::OnHold)
                    .with_note("paused"),
            )
        });
        (resolve.join().unwrap(), pause.join().unwrap())
    });

    // Whichever lands second sees the other's status and is refused
    assert_eq!(usize::from(resolved.is_ok()) + usize::from(paused.is_ok()), 1);
    let report = desk.issue(&id).unwrap();
    let expected = if resolved.is_ok() {
        IssueStatus::Resolved
    } else {
        IssueStatus::OnHold
    };
    assert_eq!(report.status(), expected);
    assert_eq!(report.progress_log().len(), 3);
    assert_eq!(report.notes().count(), 1);
    assert_eq!(
        desk.audit().records_for(&id).len(),
        1 + report.progress_log().len()
    );
    assert!(desk.audit().verify_integrity().is_ok());
}

proptest! {
    #[test]
    fn prop_resolved_rejects_every_update(
        status in prop::option::of(any_status()),
        note in "[a-z ]{0,12}",
        photos in 0usize..3,
        department in prop::option::of(any_department()),
    ) {
        let desk = setup_desk();
        let id = report_in_status(&desk, IssueStatus::Resolved);
        let before = desk.issue(&id).unwrap();

        let update = ProgressUpdate {
            new_status: status,
            note,
            new_attachments: (0..photos).map(|i| jpeg(&format!("p{i}.jpg"))).collect(),
            assign_to: department,
        };
        let err = desk.apply_update(&id, update).unwrap_err();

        prop_assert_eq!(err, UpdateError::AlreadyResolved(id.clone()));
        prop_assert_eq!(desk.issue(&id).unwrap(), before);
    }

    #[test]
    fn prop_rejected_updates_leave_report_untouched(
        start in any_status(),
        target in any_status(),
    ) {
        let desk = setup_desk();
        let id = report_in_status(&desk, start);
        let before = desk.issue(&id).unwrap();

        let update = ProgressUpdate::new()
            .with_status(target)
            .assigning(Department::Sanitation);
        match desk.apply_update(&id, update) {
            Ok(outcome) => prop_assert_eq!(outcome.report.status(), target),
            Err(_) => prop_assert_eq!(desk.issue(&id).unwrap(), before),
        }
    }
}
