//! Workday lifecycle: create-or-fetch, clock-in/out, manual save, submit.
//!
//! Every mutating operation runs inside one `BEGIN IMMEDIATE` transaction,
//! so concurrent actions on the same tutor/day serialize and a failure
//! leaves the day exactly as it was. Structural problems in the input are
//! rejected before the transaction starts.

use crate::core::attestation;
use crate::core::audit::{self, AuditEvent};
use crate::core::comparison;
use crate::core::context::CoreContext;
use crate::core::interval::{self, MinuteInterval, utc_from_minutes};
use crate::core::pay_period::{load_settings, local_date};
use crate::core::snapshot;
use crate::db::pool::DbPool;
use crate::db::{days, sessions};
use crate::errors::{AppError, AppResult};
use crate::models::actor::Actor;
use crate::models::audit::{ActorType, AuditAction};
use crate::models::day::{DayView, TimeEntryDay};
use crate::models::day_status::{ClockState, DayStatus};
use crate::models::session::{NewSession, TimeEntrySession};
use crate::models::snapshot::ScheduleSnapshotV1;
use crate::models::time_range::TimeRange;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use serde_json::json;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ClockInOutcome {
    pub view: DayView,
    pub session_id: i64,
    /// false when a session was already open (the call was a no-op)
    pub opened: bool,
}

#[derive(Debug, Clone)]
pub struct ClockOutOutcome {
    /// `None` when nothing was open and no day exists for today
    pub view: Option<DayView>,
    pub closed_session_id: Option<i64>,
    /// the open session was shorter than a minute and was dropped
    pub discarded: bool,
    pub finalized: bool,
}

impl ClockOutOutcome {
    pub fn changed(&self) -> bool {
        self.closed_session_id.is_some() || self.finalized
    }
}

pub(crate) fn floor_to_minute(ts: DateTime<Utc>) -> DateTime<Utc> {
    utc_from_minutes(ts.timestamp().div_euclid(60))
}

/// Closed sessions as wire ranges, in stored order.
pub(crate) fn closed_ranges(list: &[TimeEntrySession]) -> Vec<TimeRange> {
    list.iter().filter_map(TimeEntrySession::to_range).collect()
}

/// Parse and check a full session list: minute-aligned, positive length,
/// pairwise disjoint. Nothing is touched if this fails.
pub fn validate_sessions(ranges: &[TimeRange]) -> AppResult<Vec<NewSession>> {
    let parsed = ranges
        .iter()
        .map(MinuteInterval::from_range)
        .collect::<Result<Vec<_>, _>>()?;

    if let Some((a, b)) = interval::find_overlap(&parsed) {
        return Err(AppError::Validation(format!(
            "sessions overlap: {} and {}",
            parsed[a], parsed[b]
        )));
    }

    Ok(parsed
        .iter()
        .map(|iv| NewSession {
            start_at: utc_from_minutes(iv.start),
            end_at: utc_from_minutes(iv.end),
        })
        .collect())
}

pub fn load_view(conn: &Connection, day: TimeEntryDay) -> AppResult<DayView> {
    let sessions = sessions::list_for_day(conn, day.id)?;
    Ok(DayView { day, sessions })
}

fn reload(conn: &Connection, day_id: i64) -> AppResult<DayView> {
    let day = days::find_day_by_id(conn, day_id)?
        .ok_or_else(|| AppError::NotFound(format!("time entry day {day_id}")))?;
    load_view(conn, day)
}

/// Fetch the day, creating a draft (audited as "created") on first touch.
fn get_or_create(
    conn: &Connection,
    actor: &Actor,
    franchise_id: i64,
    tutor_id: i64,
    work_date: NaiveDate,
    timezone: &str,
    now: DateTime<Utc>,
) -> AppResult<TimeEntryDay> {
    if let Some(day) = days::find_day(conn, franchise_id, tutor_id, work_date)? {
        return Ok(day);
    }

    let id = days::insert_day(conn, franchise_id, tutor_id, work_date, timezone, now)?;
    audit::record(
        conn,
        id,
        now,
        AuditEvent::new(AuditAction::Created, *actor, None, DayStatus::Draft)
            .with_metadata(json!({ "workDate": work_date, "timezone": timezone })),
    )?;
    debug!(franchise_id, tutor_id, %work_date, day_id = id, "time entry day created");

    days::find_day_by_id(conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("time entry day {id}")))
}

/// Move an approved/denied day back to pending before the tutor changes it.
fn invalidate_if_decided(
    conn: &Connection,
    actor: &Actor,
    day: &mut TimeEntryDay,
    now: DateTime<Utc>,
    cause: &str,
) -> AppResult<bool> {
    if !day.status.is_decided() {
        return Ok(false);
    }

    let previous = day.status;
    clear_decision(day);
    day.status = DayStatus::Pending;
    day.updated_at = now;
    days::update_day(conn, day)?;

    audit::record(
        conn,
        day.id,
        now,
        AuditEvent::new(AuditAction::Invalidated, *actor, Some(previous), DayStatus::Pending)
            .with_metadata(json!({ "cause": cause })),
    )?;
    info!(day_id = day.id, %previous, "decided day invalidated");
    Ok(true)
}

pub(crate) fn clear_decision(day: &mut TimeEntryDay) {
    day.decided_by_type = None;
    day.decided_by = None;
    day.decided_at = None;
    day.decision_reason = None;
}

/// Recompute the stored comparison from the stored snapshot, if any.
pub(crate) fn refresh_comparison(day: &mut TimeEntryDay, ranges: &[TimeRange]) -> AppResult<()> {
    if let Some(snap) = &day.schedule_snapshot {
        day.comparison = Some(comparison::compute(ranges, &snap.intervals)?);
    }
    Ok(())
}

/// Apply a comparison-driven result: approved by SYSTEM on exact match,
/// otherwise pending for manual review.
fn settle(
    conn: &Connection,
    actor: &Actor,
    day: &mut TimeEntryDay,
    snapshot: Option<ScheduleSnapshotV1>,
    ranges: &[TimeRange],
    now: DateTime<Utc>,
) -> AppResult<()> {
    let previous = day.status;

    let comparison = match &snapshot {
        Some(snap) => Some(comparison::compute(ranges, &snap.intervals)?),
        None => None,
    };
    let matches = comparison.as_ref().is_some_and(|c| c.matches);

    day.schedule_snapshot = snapshot;
    day.comparison = comparison;
    day.submitted_at = Some(now);
    day.updated_at = now;

    let (action, event_actor) = if matches {
        day.status = DayStatus::Approved;
        day.decided_by_type = Some(ActorType::System);
        day.decided_by = None;
        day.decided_at = Some(now);
        day.decision_reason = None;
        (AuditAction::AutoApproved, Actor::System)
    } else {
        clear_decision(day);
        day.status = DayStatus::Pending;
        (AuditAction::Submitted, *actor)
    };

    days::update_day(conn, day)?;

    let metadata = match &day.comparison {
        Some(c) => json!({
            "sessions": ranges,
            "matches": c.matches,
            "manualMinutes": c.manual.total_minutes,
            "scheduledMinutes": c.scheduled.total_minutes,
            "manualOnly": c.diffs.manual_only,
            "scheduledOnly": c.diffs.scheduled_only,
        }),
        None => json!({ "sessions": ranges, "comparison": null }),
    };
    audit::record(
        conn,
        day.id,
        now,
        AuditEvent::new(action, event_actor, Some(previous), day.status).with_metadata(metadata),
    )?;

    info!(day_id = day.id, status = %day.status, "time entry day settled");
    Ok(())
}

fn ensure_finalizable(day: &TimeEntryDay) -> AppResult<()> {
    match day.status {
        DayStatus::Draft | DayStatus::Pending => Ok(()),
        other => Err(AppError::InvalidState(format!(
            "day {} is {other}; only draft or pending days can be submitted",
            day.work_date
        ))),
    }
}

/// Idempotent: returns the existing day or creates a draft for `work_date`.
pub fn create_or_fetch(
    pool: &mut DbPool,
    ctx: &CoreContext,
    actor: &Actor,
    franchise_id: i64,
    tutor_id: i64,
    work_date: NaiveDate,
) -> AppResult<DayView> {
    actor.ensure_tutor(tutor_id)?;
    let now = ctx.now();

    pool.with_immediate_tx(|tx| {
        let eff = load_settings(tx, ctx, franchise_id)?;
        let day = get_or_create(
            tx,
            actor,
            franchise_id,
            tutor_id,
            work_date,
            eff.timezone.name(),
            now,
        )?;
        load_view(tx, day)
    })
}

/// Clock in on today's (franchise-local) work date.
pub fn clock_in(
    pool: &mut DbPool,
    ctx: &CoreContext,
    actor: &Actor,
    franchise_id: i64,
    tutor_id: i64,
) -> AppResult<ClockInOutcome> {
    actor.ensure_tutor(tutor_id)?;
    let now = ctx.now();
    let start_at = floor_to_minute(now);

    pool.with_immediate_tx(|tx| {
        let eff = load_settings(tx, ctx, franchise_id)?;
        let work_date = local_date(&eff.timezone, now);

        attestation::require(tx, franchise_id, tutor_id, &eff.timezone, work_date, now)?;

        // re-entrant: an already open session wins, wherever it is
        if let Some(open) = sessions::find_open_for_tutor(tx, franchise_id, tutor_id)? {
            debug!(session_id = open.id, "clock-in ignored, session already open");
            return Ok(ClockInOutcome {
                view: reload(tx, open.entry_day_id)?,
                session_id: open.id,
                opened: false,
            });
        }

        let mut day = get_or_create(
            tx,
            actor,
            franchise_id,
            tutor_id,
            work_date,
            eff.timezone.name(),
            now,
        )?;

        let existing = sessions::list_for_day(tx, day.id)?;
        if let Some(clash) = existing
            .iter()
            .find(|s| s.end_at.is_some_and(|end| end > start_at))
        {
            return Err(AppError::Validation(format!(
                "clock-in at {} would overlap the session starting {}",
                start_at.format("%H:%MZ"),
                clash.start_at.format("%H:%MZ")
            )));
        }

        invalidate_if_decided(tx, actor, &mut day, now, "clock_in")?;

        let session_id = sessions::insert_open(tx, day.id, start_at)?;
        day.clock_state = ClockState::ClockedIn;
        day.updated_at = now;
        days::update_day(tx, &day)?;

        audit::record(
            tx,
            day.id,
            now,
            AuditEvent::new(AuditAction::ClockIn, *actor, Some(day.status), day.status)
                .with_metadata(json!({ "sessionId": session_id, "startAt": start_at })),
        )?;
        info!(franchise_id, tutor_id, day_id = day.id, session_id, "clocked in");

        Ok(ClockInOutcome {
            view: load_view(tx, day)?,
            session_id,
            opened: true,
        })
    })
}

/// Close the open session (if any). With `finalize`, also compare against the
/// caller's snapshot (or the stored one) and settle the day.
pub fn clock_out(
    pool: &mut DbPool,
    ctx: &CoreContext,
    actor: &Actor,
    franchise_id: i64,
    tutor_id: i64,
    finalize: bool,
    snapshot: Option<ScheduleSnapshotV1>,
) -> AppResult<ClockOutOutcome> {
    actor.ensure_tutor(tutor_id)?;
    if let Some(snap) = &snapshot {
        snapshot::verify(snap, ctx.secret())?;
    }
    let now = ctx.now();
    let end_at = floor_to_minute(now);

    pool.with_immediate_tx(|tx| {
        let eff = load_settings(tx, ctx, franchise_id)?;
        let open = sessions::find_open_for_tutor(tx, franchise_id, tutor_id)?;

        let today = local_date(&eff.timezone, now);

        // only finalizing may create today's day; a bare clock-out never writes
        let day = match &open {
            Some(s) => Some(days::find_day_by_id(tx, s.entry_day_id)?.ok_or_else(|| {
                AppError::NotFound(format!("time entry day {}", s.entry_day_id))
            })?),
            None if finalize => Some(get_or_create(
                tx,
                actor,
                franchise_id,
                tutor_id,
                today,
                eff.timezone.name(),
                now,
            )?),
            None => days::find_day(tx, franchise_id, tutor_id, today)?,
        };

        let work_date = day.as_ref().map_or(today, |d| d.work_date);
        attestation::require(tx, franchise_id, tutor_id, &eff.timezone, work_date, now)?;

        let Some(mut day) = day else {
            debug!(franchise_id, tutor_id, %today, "clock-out with nothing open and no day");
            return Ok(ClockOutOutcome {
                view: None,
                closed_session_id: None,
                discarded: false,
                finalized: false,
            });
        };

        // everything that can reject the finalize step is checked up front
        let settle_with = if finalize {
            ensure_finalizable(&day)?;
            match snapshot {
                Some(snap) => {
                    snapshot::ensure_scope(&snap, franchise_id, tutor_id, day.work_date)?;
                    Some(snap)
                }
                None => match day.schedule_snapshot.clone() {
                    Some(stored) => {
                        snapshot::verify(&stored, ctx.secret())?;
                        Some(stored)
                    }
                    None => None,
                },
            }
        } else {
            None
        };

        let mut discarded = false;
        let closed_session_id = match &open {
            Some(s) => {
                if end_at <= s.start_at {
                    sessions::delete(tx, s.id)?;
                    discarded = true;
                } else {
                    sessions::close(tx, s.id, end_at)?;
                }
                day.clock_state = ClockState::ClockedOut;
                day.updated_at = now;
                days::update_day(tx, &day)?;

                audit::record(
                    tx,
                    day.id,
                    now,
                    AuditEvent::new(AuditAction::ClockOut, *actor, Some(day.status), day.status)
                        .with_metadata(json!({
                            "sessionId": s.id,
                            "startAt": s.start_at,
                            "endAt": end_at,
                            "discarded": discarded,
                        })),
                )?;
                info!(franchise_id, tutor_id, day_id = day.id, session_id = s.id, discarded, "clocked out");
                Some(s.id)
            }
            None => {
                debug!(franchise_id, tutor_id, "clock-out with no open session");
                None
            }
        };

        if finalize {
            let ranges = closed_ranges(&sessions::list_for_day(tx, day.id)?);
            settle(tx, actor, &mut day, settle_with, &ranges, now)?;
        }

        Ok(ClockOutOutcome {
            view: Some(load_view(tx, day)?),
            closed_session_id,
            discarded,
            finalized: finalize,
        })
    })
}

/// Replace the day's sessions with a manually entered list.
pub fn save(
    pool: &mut DbPool,
    ctx: &CoreContext,
    actor: &Actor,
    franchise_id: i64,
    tutor_id: i64,
    work_date: NaiveDate,
    ranges: &[TimeRange],
) -> AppResult<DayView> {
    actor.ensure_tutor(tutor_id)?;
    let new_sessions = validate_sessions(ranges)?;
    let now = ctx.now();

    pool.with_immediate_tx(|tx| {
        let eff = load_settings(tx, ctx, franchise_id)?;
        attestation::require(tx, franchise_id, tutor_id, &eff.timezone, work_date, now)?;

        let mut day = get_or_create(
            tx,
            actor,
            franchise_id,
            tutor_id,
            work_date,
            eff.timezone.name(),
            now,
        )?;

        if day.clock_state == ClockState::ClockedIn {
            return Err(AppError::InvalidState(
                "clock out before editing this day's sessions".into(),
            ));
        }

        let before = closed_ranges(&sessions::list_for_day(tx, day.id)?);
        invalidate_if_decided(tx, actor, &mut day, now, "saved")?;

        sessions::replace_all(tx, day.id, &new_sessions)?;
        let after = closed_ranges(&sessions::list_for_day(tx, day.id)?);

        refresh_comparison(&mut day, &after)?;
        day.updated_at = now;
        days::update_day(tx, &day)?;

        audit::record(
            tx,
            day.id,
            now,
            AuditEvent::new(AuditAction::Saved, *actor, Some(day.status), day.status)
                .with_metadata(json!({
                    "sessionsBefore": before,
                    "sessionsAfter": after,
                    "matches": day.comparison.as_ref().map(|c| c.matches),
                })),
        )?;
        info!(franchise_id, tutor_id, day_id = day.id, sessions = after.len(), "day saved");

        load_view(tx, day)
    })
}

/// Submit a clocked-out day against a verified schedule snapshot.
pub fn submit(
    pool: &mut DbPool,
    ctx: &CoreContext,
    actor: &Actor,
    franchise_id: i64,
    tutor_id: i64,
    work_date: NaiveDate,
    snapshot: ScheduleSnapshotV1,
) -> AppResult<DayView> {
    actor.ensure_tutor(tutor_id)?;
    snapshot::verify(&snapshot, ctx.secret())?;
    snapshot::ensure_scope(&snapshot, franchise_id, tutor_id, work_date)?;
    let now = ctx.now();

    pool.with_immediate_tx(|tx| {
        let mut day = days::find_day(tx, franchise_id, tutor_id, work_date)?
            .ok_or_else(|| AppError::NotFound(format!("no time entries on {work_date}")))?;

        ensure_finalizable(&day)?;
        if day.clock_state == ClockState::ClockedIn {
            return Err(AppError::InvalidState(
                "clock out before submitting".into(),
            ));
        }

        let ranges = closed_ranges(&sessions::list_for_day(tx, day.id)?);
        settle(tx, actor, &mut day, Some(snapshot), &ranges, now)?;

        load_view(tx, day)
    })
}

/// Day with sessions for (franchise, tutor, date), if it exists.
pub fn view(
    conn: &Connection,
    actor: &Actor,
    franchise_id: i64,
    tutor_id: i64,
    work_date: NaiveDate,
) -> AppResult<Option<DayView>> {
    match days::find_day(conn, franchise_id, tutor_id, work_date)? {
        Some(day) => {
            audit::ensure_can_read(actor, &day, franchise_id)?;
            Ok(Some(load_view(conn, day)?))
        }
        None => Ok(None),
    }
}

pub fn view_by_id(
    conn: &Connection,
    actor: &Actor,
    franchise_id: i64,
    day_id: i64,
) -> AppResult<DayView> {
    let day = days::find_day_by_id(conn, day_id)?
        .ok_or_else(|| AppError::NotFound(format!("time entry day {day_id}")))?;
    audit::ensure_can_read(actor, &day, franchise_id)?;
    load_view(conn, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_drops_seconds() {
        let ts = DateTime::parse_from_rfc3339("2026-01-05T14:03:59.900Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(floor_to_minute(ts).to_rfc3339(), "2026-01-05T14:03:00+00:00");
    }

    #[test]
    fn overlapping_sessions_are_rejected() {
        let ranges = [
            TimeRange::new("2026-01-05T14:00:00Z", "2026-01-05T15:00:00Z"),
            TimeRange::new("2026-01-05T14:30:00Z", "2026-01-05T16:00:00Z"),
        ];
        assert!(matches!(
            validate_sessions(&ranges),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn touching_sessions_are_fine() {
        let ranges = [
            TimeRange::new("2026-01-05T09:00:00-05:00", "2026-01-05T10:00:00-05:00"),
            TimeRange::new("2026-01-05T15:00:00Z", "2026-01-05T16:00:00Z"),
        ];
        let out = validate_sessions(&ranges).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].end_at, out[1].start_at);
    }

    #[test]
    fn bad_timestamps_are_rejected() {
        let ranges = [TimeRange::new("2026-01-05T14:00:30Z", "2026-01-05T15:00:00Z")];
        assert!(matches!(
            validate_sessions(&ranges),
            Err(AppError::Interval(_))
        ));
    }
}
