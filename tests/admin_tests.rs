use tutorclock::core::admin::{self, Decision};
use tutorclock::core::audit;
use tutorclock::core::context::CoreContext;
use tutorclock::core::day;
use tutorclock::db::audit as audit_db;
use tutorclock::db::days;
use tutorclock::db::pool::DbPool;
use tutorclock::errors::{AppError, ErrorKind};
use tutorclock::models::actor::Actor;
use tutorclock::models::audit::{ActorType, AuditAction};
use tutorclock::models::day::DayView;
use tutorclock::models::day_status::{ClockState, DayStatus};
use tutorclock::models::time_range::TimeRange;

mod common;
use common::*;

/// A closed-week day with 09:00-10:30 worked against a 09:00-10:00 schedule:
/// lands in pending.
fn pending_day(pool: &mut DbPool, c: &CoreContext) -> DayView {
    day::save(
        pool,
        c,
        &tutor(),
        FRANCHISE,
        TUTOR,
        date("2025-12-29"),
        &[TimeRange::new("2025-12-29T09:00:00-05:00", "2025-12-29T10:30:00-05:00")],
    )
    .unwrap();
    let snap = signed_snapshot(c, "2025-12-29", &["9:00 AM - 10:00 AM"]);
    let view = day::submit(pool, c, &tutor(), FRANCHISE, TUTOR, date("2025-12-29"), snap).unwrap();
    assert_eq!(view.day.status, DayStatus::Pending);
    view
}

#[test]
fn deny_without_reason_is_rejected_before_touching_the_day() {
    let (_dir, mut pool) = temp_pool();
    let c = ctx("2026-01-05T14:00:00Z");
    let view = pending_day(&mut pool, &c);
    let before = audit_db::list_for_day(&pool.conn, view.day.id).unwrap().len();

    for reason in [None, Some("   ")] {
        let err = admin::decide(&mut pool, &c, &admin(), view.day.id, FRANCHISE, Decision::Deny, reason)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    let after = day::view_by_id(&pool.conn, &admin(), FRANCHISE, view.day.id).unwrap();
    assert_eq!(after.day.status, DayStatus::Pending);
    assert_eq!(audit_db::list_for_day(&pool.conn, view.day.id).unwrap().len(), before);
}

#[test]
fn deny_and_approve_record_the_admin() {
    let (_dir, mut pool) = temp_pool();
    let c = ctx("2026-01-05T14:00:00Z");
    let view = pending_day(&mut pool, &c);

    let denied = admin::decide(
        &mut pool,
        &c,
        &admin(),
        view.day.id,
        FRANCHISE,
        Decision::Deny,
        Some("not on the schedule"),
    )
    .unwrap();
    assert_eq!(denied.day.status, DayStatus::Denied);
    assert_eq!(denied.day.decided_by_type, Some(ActorType::Admin));
    assert_eq!(denied.day.decided_by, Some(ADMIN));
    assert_eq!(denied.day.decision_reason.as_deref(), Some("not on the schedule"));

    // a decided day cannot be decided again
    let err = admin::decide(&mut pool, &c, &admin(), view.day.id, FRANCHISE, Decision::Approve, None)
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    let entries = audit_db::list_for_day(&pool.conn, view.day.id).unwrap();
    let last = entries.last().unwrap();
    assert_eq!(last.action, AuditAction::Denied);
    assert_eq!(last.previous_status, Some(DayStatus::Pending));
    assert_eq!(last.actor_account_id, Some(ADMIN));
}

#[test]
fn admins_cannot_approve_their_own_time() {
    let (_dir, mut pool) = temp_pool();
    let c = ctx("2026-01-05T14:00:00Z");
    let view = pending_day(&mut pool, &c);
    let same_person = Actor::Admin { account_id: TUTOR };

    let err = admin::decide(&mut pool, &c, &same_person, view.day.id, FRANCHISE, Decision::Approve, None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
}

#[test]
fn tutors_cannot_decide() {
    let (_dir, mut pool) = temp_pool();
    let c = ctx("2026-01-05T14:00:00Z");
    let view = pending_day(&mut pool, &c);

    let err = admin::decide(&mut pool, &c, &tutor(), view.day.id, FRANCHISE, Decision::Approve, None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
}

#[test]
fn draft_days_cannot_be_decided() {
    let (_dir, mut pool) = temp_pool();
    let c = ctx("2026-01-05T14:00:00Z");
    let draft =
        day::create_or_fetch(&mut pool, &c, &tutor(), FRANCHISE, TUTOR, date("2025-12-30")).unwrap();

    let err = admin::decide(&mut pool, &c, &admin(), draft.day.id, FRANCHISE, Decision::Approve, None)
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
}

#[test]
fn other_franchise_admin_is_turned_away() {
    let (_dir, mut pool) = temp_pool();
    let c = ctx("2026-01-05T14:00:00Z");
    let view = pending_day(&mut pool, &c);

    let err = admin::decide(&mut pool, &c, &admin(), view.day.id, FRANCHISE + 1, Decision::Approve, None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
}

#[test]
fn fixing_an_approved_day_invalidates_then_rewrites() {
    let (_dir, mut pool) = temp_pool();
    let c = ctx("2026-01-05T14:00:00Z");
    let view = pending_day(&mut pool, &c);
    admin::decide(&mut pool, &c, &admin(), view.day.id, FRANCHISE, Decision::Approve, None).unwrap();

    let fixed = admin::fix(
        &mut pool,
        &c,
        &admin(),
        view.day.id,
        FRANCHISE,
        &[TimeRange::new("2025-12-29T14:00:00Z", "2025-12-29T15:00:00Z")],
        Some("tutor left at ten"),
    )
    .unwrap();

    assert_eq!(fixed.day.status, DayStatus::Pending);
    assert_eq!(fixed.day.clock_state, ClockState::ClockedOut);
    assert_eq!(fixed.day.decided_by, None);
    assert_eq!(fixed.sessions.len(), 1);
    // now equal to the stored schedule, but an admin fix never auto-approves
    assert!(fixed.day.comparison.as_ref().unwrap().matches);

    let entries = audit_db::list_for_day(&pool.conn, view.day.id).unwrap();
    let n = entries.len();
    assert_eq!(entries[n - 2].action, AuditAction::Invalidated);
    assert_eq!(entries[n - 2].previous_status, Some(DayStatus::Approved));
    assert_eq!(entries[n - 1].action, AuditAction::AdminFixed);
    assert_eq!(entries[n - 1].metadata["reason"], "tutor left at ten");
    assert_eq!(entries[n - 1].metadata["sessionsAfter"][0]["start"], "2025-12-29T14:00:00Z");
}

#[test]
fn fix_requires_a_reason_and_valid_sessions() {
    let (_dir, mut pool) = temp_pool();
    let c = ctx("2026-01-05T14:00:00Z");
    let view = pending_day(&mut pool, &c);
    let ok = [TimeRange::new("2025-12-29T14:00:00Z", "2025-12-29T15:00:00Z")];

    let err = admin::fix(&mut pool, &c, &admin(), view.day.id, FRANCHISE, &ok, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let overlapping = [
        TimeRange::new("2025-12-29T14:00:00Z", "2025-12-29T15:00:00Z"),
        TimeRange::new("2025-12-29T14:59:00Z", "2025-12-29T16:00:00Z"),
    ];
    let err = admin::fix(&mut pool, &c, &admin(), view.day.id, FRANCHISE, &overlapping, Some("x"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn edit_session_changes_one_session_only() {
    let (_dir, mut pool) = temp_pool();
    let c = ctx("2026-01-05T14:00:00Z");
    day::save(
        &mut pool,
        &c,
        &tutor(),
        FRANCHISE,
        TUTOR,
        date("2025-12-29"),
        &[
            TimeRange::new("2025-12-29T14:00:00Z", "2025-12-29T15:00:00Z"),
            TimeRange::new("2025-12-29T18:00:00Z", "2025-12-29T19:00:00Z"),
        ],
    )
    .unwrap();
    let view = day::submit(
        &mut pool,
        &c,
        &tutor(),
        FRANCHISE,
        TUTOR,
        date("2025-12-29"),
        signed_snapshot(&c, "2025-12-29", &["9:00 AM - 10:00 AM"]),
    )
    .unwrap();
    let afternoon = view.sessions[1].id;

    // moving it onto the morning session is an overlap
    let err = admin::edit_session(
        &mut pool,
        &c,
        &admin(),
        view.day.id,
        FRANCHISE,
        afternoon,
        &TimeRange::new("2025-12-29T14:30:00Z", "2025-12-29T15:30:00Z"),
        Some("typo"),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let edited = admin::edit_session(
        &mut pool,
        &c,
        &admin(),
        view.day.id,
        FRANCHISE,
        afternoon,
        &TimeRange::new("2025-12-29T18:00:00Z", "2025-12-29T18:30:00Z"),
        Some("left early"),
    )
    .unwrap();
    assert_eq!(edited.worked_minutes(), 90);
    assert_eq!(edited.day.status, DayStatus::Pending);

    let (_, entries) = audit::trail(&pool.conn, &admin(), FRANCHISE, view.day.id).unwrap();
    let last = entries.last().unwrap();
    assert_eq!(last.action, AuditAction::AdminEdited);
    assert_eq!(last.metadata["to"]["end"], "2025-12-29T18:30:00Z");

    let err = admin::edit_session(
        &mut pool,
        &c,
        &admin(),
        view.day.id,
        FRANCHISE,
        9999,
        &TimeRange::new("2025-12-29T20:00:00Z", "2025-12-29T21:00:00Z"),
        Some("x"),
    )
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn audit_trail_is_scoped_to_the_reader() {
    let (_dir, mut pool) = temp_pool();
    let c = ctx("2026-01-05T14:00:00Z");
    let view = pending_day(&mut pool, &c);

    assert!(audit::trail(&pool.conn, &tutor(), FRANCHISE, view.day.id).is_ok());
    let stranger = Actor::Tutor { account_id: TUTOR + 5 };
    let err = audit::trail(&pool.conn, &stranger, FRANCHISE, view.day.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
}

#[test]
fn unknown_decider_type_in_storage_is_an_error() {
    let (_dir, mut pool) = temp_pool();
    let c = ctx("2026-01-05T14:00:00Z");
    let view = pending_day(&mut pool, &c);
    admin::decide(&mut pool, &c, &admin(), view.day.id, FRANCHISE, Decision::Approve, None).unwrap();

    pool.conn
        .execute(
            "UPDATE time_entry_days SET decided_by_type = 'robot' WHERE id = ?1",
            [view.day.id],
        )
        .unwrap();

    let err = days::find_day_by_id(&pool.conn, view.day.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Fatal);
}

