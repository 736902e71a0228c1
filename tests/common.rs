#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use chrono::{DateTime, NaiveDate, Utc};
use std::env;
use std::fs;
use std::path::PathBuf;
use tutorclock::core::attestation;
use tutorclock::core::context::CoreContext;
use tutorclock::core::snapshot::{self, SnapshotScope};
use tutorclock::db::initialize::init_db;
use tutorclock::db::pool::DbPool;
use tutorclock::models::actor::Actor;
use tutorclock::models::attestation::NewAttestation;
use tutorclock::models::snapshot::{ScheduleEntry, ScheduleSnapshotV1};

pub const FRANCHISE: i64 = 10;
pub const TUTOR: i64 = 42;
pub const ADMIN: i64 = 7;
pub const SECRET: &[u8] = b"integration-test-secret";

pub fn tc() -> Command {
    let mut cmd = cargo_bin_cmd!("tutorclock");
    cmd.env_remove("TUTORCLOCK_SIGNING_SECRET")
        .env_remove("TUTORCLOCK_LOG");
    cmd
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_tutorclock.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    for suffix in ["", "-wal", "-shm"] {
        fs::remove_file(format!("{db_path}{suffix}")).ok();
    }
    db_path
}

/// Create a temporary output file path inside tempdir and ensure it's removed
pub fn temp_out(name: &str, ext: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_out.{}", name, ext));
    let p = path.to_string_lossy().to_string();
    fs::remove_file(&p).ok();
    p
}

pub fn at(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("valid instant")
        .with_timezone(&Utc)
}

pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date")
}

/// Signed context pinned to `now`. Franchise default timezone is New York.
pub fn ctx(now: &str) -> CoreContext {
    CoreContext::default().with_secret(SECRET).with_now(at(now))
}

pub fn tutor() -> Actor {
    Actor::Tutor { account_id: TUTOR }
}

pub fn admin() -> Actor {
    Actor::Admin { account_id: ADMIN }
}

/// Fresh migrated database in a temp dir (kept alive by the returned guard).
pub fn temp_pool() -> (tempfile::TempDir, DbPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tutorclock.sqlite");
    let pool = DbPool::new(&path.to_string_lossy()).expect("open db");
    init_db(&pool.conn).expect("init db");
    (dir, pool)
}

pub fn attest(pool: &DbPool, ctx: &CoreContext, week_end: &str) {
    attestation::record(
        &pool.conn,
        ctx,
        &tutor(),
        NewAttestation {
            franchise_id: FRANCHISE,
            tutor_id: TUTOR,
            week_end: date(week_end),
            typed_name: "Jamie Rivera".into(),
            attestation_text: "Hours are accurate.".into(),
            attestation_version: "v1".into(),
            metadata: serde_json::json!({}),
        },
    )
    .expect("attestation recorded");
}

pub fn signed_snapshot(ctx: &CoreContext, work_date: &str, labels: &[&str]) -> ScheduleSnapshotV1 {
    let scope = SnapshotScope {
        franchise_id: FRANCHISE,
        tutor_id: TUTOR,
        work_date: date(work_date),
        timezone: "America/New_York".into(),
    };
    let entries = labels
        .iter()
        .enumerate()
        .map(|(i, l)| ScheduleEntry {
            slot_id: format!("slot-{i}"),
            label: l.to_string(),
        })
        .collect();
    let snap = snapshot::derive(&scope, None, entries, ctx.now()).expect("derive");
    snapshot::sign(&snap, SECRET).expect("sign")
}
