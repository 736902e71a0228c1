//! Admin actions on a tutor's day: decide, fix (full rewrite), edit one session.

use crate::core::audit::{self, AuditEvent};
use crate::core::context::CoreContext;
use crate::core::day::{clear_decision, closed_ranges, load_view, refresh_comparison, validate_sessions};
use crate::core::interval::MinuteInterval;
use crate::db::pool::DbPool;
use crate::db::{days, sessions};
use crate::errors::{AppError, AppResult};
use crate::models::actor::Actor;
use crate::models::audit::{ActorType, AuditAction};
use crate::models::day::{DayView, TimeEntryDay};
use crate::models::day_status::{ClockState, DayStatus};
use crate::models::session::NewSession;
use crate::models::time_range::TimeRange;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde_json::{Value, json};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Deny,
}

impl Decision {
    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw.trim().to_lowercase().as_str() {
            "approve" | "approved" => Ok(Decision::Approve),
            "deny" | "denied" => Ok(Decision::Deny),
            other => Err(AppError::Validation(format!(
                "Unknown decision '{other}'. Use 'approve' or 'deny'."
            ))),
        }
    }
}

fn required_reason(reason: Option<&str>, what: &str) -> AppResult<String> {
    match reason.map(str::trim) {
        Some(r) if !r.is_empty() => Ok(r.to_string()),
        _ => Err(AppError::Validation(format!("a reason is required to {what}"))),
    }
}

fn load_scoped_day(conn: &Connection, day_id: i64, franchise_id: i64) -> AppResult<TimeEntryDay> {
    let day = days::find_day_by_id(conn, day_id)?
        .ok_or_else(|| AppError::NotFound(format!("time entry day {day_id}")))?;
    if day.franchise_id != franchise_id {
        return Err(AppError::Authorization(
            "day belongs to another franchise".into(),
        ));
    }
    Ok(day)
}

/// Approve or deny a pending day.
pub fn decide(
    pool: &mut DbPool,
    ctx: &CoreContext,
    actor: &Actor,
    day_id: i64,
    franchise_id: i64,
    decision: Decision,
    reason: Option<&str>,
) -> AppResult<DayView> {
    let admin_id = actor.ensure_admin()?;
    let reason = match decision {
        Decision::Deny => Some(required_reason(reason, "deny a day")?),
        Decision::Approve => reason.map(str::trim).filter(|r| !r.is_empty()).map(String::from),
    };
    let now = ctx.now();

    pool.with_immediate_tx(|tx| {
        let mut day = load_scoped_day(tx, day_id, franchise_id)?;

        if day.tutor_id == admin_id {
            return Err(AppError::Authorization(
                "admins may not decide their own time entries".into(),
            ));
        }
        if day.status != DayStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "day {} is {}; only pending days can be decided",
                day.id, day.status
            )));
        }
        if day.clock_state == ClockState::ClockedIn {
            return Err(AppError::InvalidState(
                "tutor is still clocked in on this day".into(),
            ));
        }

        let (new_status, action) = match decision {
            Decision::Approve => (DayStatus::Approved, AuditAction::Approved),
            Decision::Deny => (DayStatus::Denied, AuditAction::Denied),
        };

        day.status = new_status;
        day.decided_by_type = Some(ActorType::Admin);
        day.decided_by = Some(admin_id);
        day.decided_at = Some(now);
        day.decision_reason = reason.clone();
        day.updated_at = now;
        days::update_day(tx, &day)?;

        audit::record(
            tx,
            day.id,
            now,
            AuditEvent::new(action, *actor, Some(DayStatus::Pending), new_status)
                .with_metadata(json!({ "reason": reason })),
        )?;
        info!(day_id, admin_id, status = %new_status, "day decided");

        load_view(tx, day)
    })
}

/// Shared tail of `fix` and `edit_session`: rewrite sessions, return the day
/// to pending and audit ("invalidated" first when it was approved).
fn rewrite(
    conn: &Connection,
    actor: &Actor,
    mut day: TimeEntryDay,
    new_sessions: &[NewSession],
    action: AuditAction,
    mut metadata: Value,
    now: DateTime<Utc>,
) -> AppResult<DayView> {
    let before = closed_ranges(&sessions::list_for_day(conn, day.id)?);
    let mut previous = day.status;

    if previous == DayStatus::Approved {
        audit::record(
            conn,
            day.id,
            now,
            AuditEvent::new(AuditAction::Invalidated, *actor, Some(previous), DayStatus::Pending)
                .with_metadata(json!({ "cause": action.to_db_str() })),
        )?;
        previous = DayStatus::Pending;
    }

    sessions::replace_all(conn, day.id, new_sessions)?;
    let after = closed_ranges(&sessions::list_for_day(conn, day.id)?);

    clear_decision(&mut day);
    day.status = DayStatus::Pending;
    day.clock_state = ClockState::ClockedOut;
    refresh_comparison(&mut day, &after)?;
    day.updated_at = now;
    days::update_day(conn, &day)?;

    if let Value::Object(map) = &mut metadata {
        map.insert("sessionsBefore".into(), json!(before));
        map.insert("sessionsAfter".into(), json!(after));
        map.insert(
            "matches".into(),
            json!(day.comparison.as_ref().map(|c| c.matches)),
        );
    }
    audit::record(
        conn,
        day.id,
        now,
        AuditEvent::new(action, *actor, Some(previous), DayStatus::Pending).with_metadata(metadata),
    )?;
    info!(day_id = day.id, action = action.to_db_str(), "day rewritten by admin");

    load_view(conn, day)
}

/// Replace every session of the day. The day always ends up pending.
pub fn fix(
    pool: &mut DbPool,
    ctx: &CoreContext,
    actor: &Actor,
    day_id: i64,
    franchise_id: i64,
    ranges: &[TimeRange],
    reason: Option<&str>,
) -> AppResult<DayView> {
    actor.ensure_admin()?;
    let reason = required_reason(reason, "fix a day")?;
    let new_sessions = validate_sessions(ranges)?;
    let now = ctx.now();

    pool.with_immediate_tx(|tx| {
        let day = load_scoped_day(tx, day_id, franchise_id)?;
        rewrite(
            tx,
            actor,
            day,
            &new_sessions,
            AuditAction::AdminFixed,
            json!({ "reason": reason }),
            now,
        )
    })
}

/// Replace the bounds of one closed session.
#[allow(clippy::too_many_arguments)]
pub fn edit_session(
    pool: &mut DbPool,
    ctx: &CoreContext,
    actor: &Actor,
    day_id: i64,
    franchise_id: i64,
    session_id: i64,
    range: &TimeRange,
    reason: Option<&str>,
) -> AppResult<DayView> {
    actor.ensure_admin()?;
    let reason = required_reason(reason, "edit a session")?;
    MinuteInterval::from_range(range)?;
    let now = ctx.now();

    pool.with_immediate_tx(|tx| {
        let day = load_scoped_day(tx, day_id, franchise_id)?;
        let current = sessions::list_for_day(tx, day.id)?;

        let target = current
            .iter()
            .find(|s| s.id == session_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("session {session_id} on day {day_id}"))
            })?;
        if target.is_open() {
            return Err(AppError::InvalidState(
                "cannot edit a session that is still open".into(),
            ));
        }

        let mut ranges: Vec<TimeRange> = current
            .iter()
            .filter(|s| s.id != session_id)
            .filter_map(|s| s.to_range())
            .collect();
        ranges.push(range.clone());
        let new_sessions = validate_sessions(&ranges)?;

        let old = target.to_range();
        rewrite(
            tx,
            actor,
            day,
            &new_sessions,
            AuditAction::AdminEdited,
            json!({
                "reason": reason,
                "sessionId": session_id,
                "from": old,
                "to": range,
            }),
            now,
        )
    })
}
