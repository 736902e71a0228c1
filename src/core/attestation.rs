//! Weekly attestation gate.
//!
//! Workweeks run Sunday to Saturday in franchise-local time. Entry into a
//! closed week is always allowed; entry into the open week requires an
//! attestation for the week that closed just before it.

use crate::core::context::CoreContext;
use crate::core::pay_period::{load_settings, local_date};
use crate::db::attestations;
use crate::errors::{AppError, AppResult};
use crate::models::actor::Actor;
use crate::models::attestation::{NewAttestation, WeeklyAttestation};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use rusqlite::Connection;
use thiserror::Error;
use tracing::{info, warn};

/// Gate failures are typed: if storage cannot answer, entry is refused.
#[derive(Error, Debug)]
pub enum GateError {
    #[error("attestation storage unavailable: {0}")]
    Storage(#[from] rusqlite::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Allowed,
    Blocked { missing_week_end: NaiveDate },
}

impl GateOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateOutcome::Allowed)
    }
}

/// Sunday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

pub fn current_week_start(tz: &Tz, now: DateTime<Utc>) -> NaiveDate {
    week_start(local_date(tz, now))
}

/// Decide whether `work_date` may receive new time entries right now.
pub fn check(
    conn: &Connection,
    franchise_id: i64,
    tutor_id: i64,
    tz: &Tz,
    work_date: NaiveDate,
    now: DateTime<Utc>,
) -> Result<GateOutcome, GateError> {
    let open_week_start = current_week_start(tz, now);

    if work_date < open_week_start {
        return Ok(GateOutcome::Allowed);
    }

    let prior_week_end = open_week_start - Duration::days(1);
    if attestations::exists_for_week_end(conn, franchise_id, tutor_id, prior_week_end)? {
        Ok(GateOutcome::Allowed)
    } else {
        Ok(GateOutcome::Blocked {
            missing_week_end: prior_week_end,
        })
    }
}

/// Run the gate and turn a block into `AttestationRequired`.
pub fn require(
    conn: &Connection,
    franchise_id: i64,
    tutor_id: i64,
    tz: &Tz,
    work_date: NaiveDate,
    now: DateTime<Utc>,
) -> AppResult<()> {
    match check(conn, franchise_id, tutor_id, tz, work_date, now)? {
        GateOutcome::Allowed => Ok(()),
        GateOutcome::Blocked { missing_week_end } => {
            warn!(franchise_id, tutor_id, %work_date, %missing_week_end, "time entry blocked by attestation gate");
            Err(AppError::AttestationRequired { missing_week_end })
        }
    }
}

/// Record a tutor's attestation for a closed week.
pub fn record(
    conn: &Connection,
    ctx: &CoreContext,
    actor: &Actor,
    new: NewAttestation,
) -> AppResult<WeeklyAttestation> {
    actor.ensure_tutor(new.tutor_id)?;

    let typed_name = new.typed_name.trim().to_string();
    if typed_name.is_empty() {
        return Err(AppError::Validation(
            "typed name is required to attest".into(),
        ));
    }
    if new.week_end.weekday() != Weekday::Sat {
        return Err(AppError::Validation(format!(
            "week end {} is not a Saturday",
            new.week_end
        )));
    }

    let eff = load_settings(conn, ctx, new.franchise_id)?;
    let now = ctx.now();
    let open_week_start = current_week_start(&eff.timezone, now);
    if new.week_end >= open_week_start {
        return Err(AppError::Validation(format!(
            "week ending {} is not closed yet",
            new.week_end
        )));
    }

    if attestations::exists_for_week_end(conn, new.franchise_id, new.tutor_id, new.week_end)? {
        return Err(AppError::Validation(format!(
            "week ending {} is already attested",
            new.week_end
        )));
    }

    let att = WeeklyAttestation {
        id: 0,
        franchise_id: new.franchise_id,
        tutor_id: new.tutor_id,
        week_start: new.week_end - Duration::days(6),
        week_end: new.week_end,
        timezone: eff.timezone.name().to_string(),
        typed_name,
        signed_at: now,
        attestation_text: new.attestation_text,
        attestation_version: new.attestation_version,
        metadata: new.metadata,
    };

    let id = attestations::insert(conn, &att)?;
    info!(franchise_id = att.franchise_id, tutor_id = att.tutor_id, week_end = %att.week_end, "weekly attestation recorded");

    Ok(WeeklyAttestation { id, ..att })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn week_start_is_sunday() {
        assert_eq!(week_start(d(2026, 1, 4)), d(2026, 1, 4));
        assert_eq!(week_start(d(2026, 1, 5)), d(2026, 1, 4));
        assert_eq!(week_start(d(2026, 1, 10)), d(2026, 1, 4));
        assert_eq!(week_start(d(2026, 1, 11)), d(2026, 1, 11));
    }

    #[test]
    fn current_week_uses_local_date() {
        let tz: Tz = "America/New_York".parse().unwrap();
        // Sunday 02:00 UTC is still Saturday evening in New York
        let now = DateTime::parse_from_rfc3339("2026-01-11T02:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(current_week_start(&tz, now), d(2026, 1, 4));
    }
}
