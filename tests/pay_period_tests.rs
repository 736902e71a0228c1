use tutorclock::core::attestation::{self, GateOutcome};
use tutorclock::core::pay_period::{create_override, resolve_pay_period, update_settings};
use tutorclock::db::attestations;
use tutorclock::errors::ErrorKind;
use tutorclock::models::actor::Actor;
use tutorclock::models::attestation::NewAttestation;
use tutorclock::models::pay_period::{FranchiseSettings, PayPeriodSource, PeriodType};

mod common;
use common::*;

fn settings(tz: &str, period: &str, anchor: Option<&str>) -> FranchiseSettings {
    FranchiseSettings {
        franchise_id: FRANCHISE,
        timezone: Some(tz.into()),
        period_type: Some(period.into()),
        biweekly_anchor: anchor.map(date),
    }
}

#[test]
fn biweekly_period_from_anchor() {
    let (_dir, pool) = temp_pool();
    let c = ctx("2024-01-20T12:00:00Z");
    let warnings = update_settings(
        &pool.conn,
        &c,
        &admin(),
        &settings("America/Chicago", "biweekly", Some("2024-01-01")),
    )
    .unwrap();
    assert!(warnings.is_empty());

    let p = resolve_pay_period(&pool.conn, &c, FRANCHISE, Some(date("2024-01-20"))).unwrap();
    assert_eq!(p.start_date, date("2024-01-15"));
    assert_eq!(p.end_date, date("2024-01-28"));
    assert_eq!(p.source, PayPeriodSource::Computed);
    assert_eq!(p.start_at, at("2024-01-15T06:00:00Z"));
    assert_eq!(p.end_at, at("2024-01-29T06:00:00Z"));
}

#[test]
fn defaults_to_today_in_franchise_time() {
    let (_dir, pool) = temp_pool();
    // 03:00 UTC on the 16th is still the 15th in New York
    let c = ctx("2026-01-16T03:00:00Z");
    update_settings(&pool.conn, &c, &admin(), &settings("America/New_York", "semimonthly", None))
        .unwrap();

    let p = resolve_pay_period(&pool.conn, &c, FRANCHISE, None).unwrap();
    assert_eq!(p.resolved_for_date, date("2026-01-15"));
    assert_eq!(p.start_date, date("2026-01-01"));
    assert_eq!(p.end_date, date("2026-01-15"));
}

#[test]
fn newest_override_wins() {
    let (_dir, pool) = temp_pool();
    let c = ctx("2026-01-05T12:00:00Z");

    create_override(&pool.conn, &c, &admin(), FRANCHISE, date("2026-01-01"), date("2026-01-20"), None)
        .unwrap();
    let later = ctx("2026-01-05T13:00:00Z");
    let newer = create_override(
        &pool.conn,
        &later,
        &admin(),
        FRANCHISE,
        date("2026-01-10"),
        date("2026-01-12"),
        Some("holiday shuffle"),
    )
    .unwrap();

    let p = resolve_pay_period(&pool.conn, &c, FRANCHISE, Some(date("2026-01-11"))).unwrap();
    assert_eq!(p.source, PayPeriodSource::Override);
    assert_eq!(p.override_id, Some(newer.id));
    assert_eq!((p.start_date, p.end_date), (date("2026-01-10"), date("2026-01-12")));

    let p = resolve_pay_period(&pool.conn, &c, FRANCHISE, Some(date("2026-01-02"))).unwrap();
    assert_eq!(p.start_date, date("2026-01-01"));

    // other franchises are unaffected
    let p = resolve_pay_period(&pool.conn, &c, FRANCHISE + 1, Some(date("2026-01-11"))).unwrap();
    assert_eq!(p.source, PayPeriodSource::Computed);
}

#[test]
fn override_validation_and_scope() {
    let (_dir, pool) = temp_pool();
    let c = ctx("2026-01-05T12:00:00Z");

    let err = create_override(&pool.conn, &c, &admin(), FRANCHISE, date("2026-01-20"), date("2026-01-10"), None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = create_override(&pool.conn, &c, &tutor(), FRANCHISE, date("2026-01-01"), date("2026-01-10"), None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
}

#[test]
fn junk_settings_are_stored_but_fall_back() {
    let (_dir, pool) = temp_pool();
    let c = ctx("2026-01-07T12:00:00Z");

    let warnings =
        update_settings(&pool.conn, &c, &admin(), &settings("Mars/Base", "fortnightly", None)).unwrap();
    assert_eq!(warnings.len(), 2);

    let p = resolve_pay_period(&pool.conn, &c, FRANCHISE, Some(date("2026-01-07"))).unwrap();
    assert_eq!(p.timezone, "America/New_York");
    assert_eq!(p.period_type, PeriodType::Biweekly);
}

#[test]
fn settings_are_admin_only() {
    let (_dir, pool) = temp_pool();
    let c = ctx("2026-01-07T12:00:00Z");
    let err = update_settings(&pool.conn, &c, &tutor(), &settings("America/New_York", "weekly", None))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
}

fn new_attestation(week_end: &str, name: &str) -> NewAttestation {
    NewAttestation {
        franchise_id: FRANCHISE,
        tutor_id: TUTOR,
        week_end: date(week_end),
        typed_name: name.into(),
        attestation_text: "Hours are accurate.".into(),
        attestation_version: "v1".into(),
        metadata: serde_json::json!({ "source": "test" }),
    }
}

#[test]
fn attestations_only_for_closed_saturdays() {
    let (_dir, pool) = temp_pool();
    let c = ctx("2026-01-07T12:00:00Z");

    // Friday
    let err = attestation::record(&pool.conn, &c, &tutor(), new_attestation("2026-01-02", "Jamie"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    // the open week
    let err = attestation::record(&pool.conn, &c, &tutor(), new_attestation("2026-01-10", "Jamie"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = attestation::record(&pool.conn, &c, &tutor(), new_attestation("2026-01-03", "  "))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let someone_else = Actor::Tutor { account_id: TUTOR + 1 };
    let err = attestation::record(&pool.conn, &c, &someone_else, new_attestation("2026-01-03", "Jamie"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    let att = attestation::record(&pool.conn, &c, &tutor(), new_attestation("2026-01-03", " Jamie "))
        .unwrap();
    assert_eq!(att.week_start, date("2025-12-28"));
    assert_eq!(att.typed_name, "Jamie");
    assert_eq!(att.timezone, "America/New_York");

    let err = attestation::record(&pool.conn, &c, &tutor(), new_attestation("2026-01-03", "Jamie"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let all = attestations::list_for_tutor(&pool.conn, FRANCHISE, TUTOR).unwrap();
    assert_eq!(all.len(), 1);
}

#[test]
fn gate_never_blocks_closed_weeks() {
    let (_dir, pool) = temp_pool();
    let now = at("2026-01-12T14:00:00Z");
    let tz = chrono_tz::America::New_York;

    let check = |d: &str| attestation::check(&pool.conn, FRANCHISE, TUTOR, &tz, date(d), now).unwrap();

    assert_eq!(check("2026-01-10"), GateOutcome::Allowed);
    assert_eq!(check("2025-06-01"), GateOutcome::Allowed);
    assert_eq!(
        check("2026-01-12"),
        GateOutcome::Blocked {
            missing_week_end: date("2026-01-10")
        }
    );
    // future dates in the open week are gated the same way
    assert!(!check("2026-01-17").is_allowed());
}
