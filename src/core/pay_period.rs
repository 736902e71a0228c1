//! Pay period resolution.
//!
//! Never hard-fails on bad franchise configuration: an unknown timezone or
//! period type silently falls back to the defaults, because every other
//! query is scoped by the period this returns.

use crate::core::context::CoreContext;
use crate::db::settings;
use crate::errors::{AppError, AppResult};
use crate::models::actor::Actor;
use crate::models::pay_period::{
    FranchiseSettings, PayPeriod, PayPeriodOverride, PayPeriodSource, PeriodType,
};
use crate::utils::date::last_day_of_month;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use rusqlite::Connection;
use tracing::{debug, info, warn};

/// Settings after defaults and fallbacks have been applied.
#[derive(Debug, Clone)]
pub struct EffectiveSettings {
    pub timezone: Tz,
    pub period_type: PeriodType,
    pub biweekly_anchor: NaiveDate,
}

pub fn effective_settings(
    stored: Option<&FranchiseSettings>,
    ctx: &CoreContext,
) -> EffectiveSettings {
    let timezone = stored
        .and_then(|s| s.timezone.as_deref())
        .map(|raw| {
            raw.parse::<Tz>().unwrap_or_else(|_| {
                warn!(timezone = raw, "unparsable franchise timezone, using default");
                ctx.default_timezone
            })
        })
        .unwrap_or(ctx.default_timezone);

    let period_type = stored
        .and_then(|s| s.period_type.as_deref())
        .map(|raw| {
            PeriodType::from_db_str(raw).unwrap_or_else(|| {
                warn!(period_type = raw, "unknown period type, using default");
                ctx.default_period_type
            })
        })
        .unwrap_or(ctx.default_period_type);

    let biweekly_anchor = stored
        .and_then(|s| s.biweekly_anchor)
        .unwrap_or(ctx.default_biweekly_anchor);

    EffectiveSettings {
        timezone,
        period_type,
        biweekly_anchor,
    }
}

/// Load a franchise's effective settings.
pub fn load_settings(
    conn: &Connection,
    ctx: &CoreContext,
    franchise_id: i64,
) -> AppResult<EffectiveSettings> {
    let stored = settings::load_franchise_settings(conn, franchise_id)?;
    Ok(effective_settings(stored.as_ref(), ctx))
}

/// Calendar date in `tz` at instant `now`.
pub fn local_date(tz: &Tz, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(tz).date_naive()
}

/// First instant of `date` in `tz`, as UTC. If local midnight is skipped by
/// a DST jump, the first existing local time that day is used.
pub fn start_of_day_utc(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);

    for step in 0..=24 * 4 {
        let candidate = midnight + Duration::minutes(15 * step);
        if let Some(dt) = tz.from_local_datetime(&candidate).earliest() {
            return dt.with_timezone(&Utc);
        }
    }
    Utc.from_utc_datetime(&midnight)
}

/// Inclusive local [start, end] window for `period_type` containing `date`.
pub fn compute_window(
    period_type: PeriodType,
    date: NaiveDate,
    biweekly_anchor: NaiveDate,
) -> (NaiveDate, NaiveDate) {
    match period_type {
        PeriodType::Weekly => {
            let start = date - Duration::days(date.weekday().num_days_from_monday() as i64);
            (start, start + Duration::days(6))
        }
        PeriodType::Biweekly => {
            let offset = (date - biweekly_anchor).num_days().div_euclid(14) * 14;
            let start = biweekly_anchor + Duration::days(offset);
            (start, start + Duration::days(13))
        }
        PeriodType::Semimonthly => {
            let (y, m) = (date.year(), date.month());
            if date.day() <= 15 {
                (
                    date.with_day(1).unwrap_or(date),
                    date.with_day(15).unwrap_or(date),
                )
            } else {
                (
                    date.with_day(16).unwrap_or(date),
                    date.with_day(last_day_of_month(y, m)).unwrap_or(date),
                )
            }
        }
        PeriodType::Monthly => {
            let (y, m) = (date.year(), date.month());
            (
                date.with_day(1).unwrap_or(date),
                date.with_day(last_day_of_month(y, m)).unwrap_or(date),
            )
        }
    }
}

/// Half-open UTC bounds `[startOfDay(start), startOfDay(end + 1))`.
pub fn utc_bounds(tz: &Tz, start: NaiveDate, end: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        start_of_day_utc(tz, start),
        start_of_day_utc(tz, end + Duration::days(1)),
    )
}

/// Resolve the pay period containing `for_date` (default: today, local).
pub fn resolve_pay_period(
    conn: &Connection,
    ctx: &CoreContext,
    franchise_id: i64,
    for_date: Option<NaiveDate>,
) -> AppResult<PayPeriod> {
    let eff = load_settings(conn, ctx, franchise_id)?;
    let date = for_date.unwrap_or_else(|| local_date(&eff.timezone, ctx.now()));

    let (start_date, end_date, source, override_id) =
        match settings::find_override_containing(conn, franchise_id, date)? {
            Some(ov) => {
                debug!(franchise_id, override_id = ov.id, %date, "pay period override applies");
                (ov.start_date, ov.end_date, PayPeriodSource::Override, Some(ov.id))
            }
            None => {
                let (s, e) = compute_window(eff.period_type, date, eff.biweekly_anchor);
                (s, e, PayPeriodSource::Computed, None)
            }
        };

    let (start_at, end_at) = utc_bounds(&eff.timezone, start_date, end_date);

    Ok(PayPeriod {
        franchise_id,
        timezone: eff.timezone.name().to_string(),
        period_type: eff.period_type,
        start_date,
        end_date,
        start_at,
        end_at,
        source,
        override_id,
        resolved_for_date: date,
    })
}

/// Store franchise settings as given (admin only). Bad values are kept and
/// fall back at resolution time; they are only reported here.
pub fn update_settings(
    conn: &Connection,
    ctx: &CoreContext,
    actor: &Actor,
    settings: &FranchiseSettings,
) -> AppResult<Vec<String>> {
    actor.ensure_admin()?;

    let mut warnings = Vec::new();
    if let Some(tz) = settings.timezone.as_deref()
        && tz.parse::<Tz>().is_err()
    {
        warnings.push(format!("timezone '{tz}' is not recognised; the default will be used"));
    }
    if let Some(pt) = settings.period_type.as_deref()
        && PeriodType::from_db_str(pt).is_none()
    {
        warnings.push(format!("period type '{pt}' is not recognised; the default will be used"));
    }

    settings::upsert_franchise_settings(conn, settings, ctx.now())?;
    info!(franchise_id = settings.franchise_id, "franchise settings updated");
    Ok(warnings)
}

/// Add a manual pay period `[start, end]` (admin only). Newer overrides win
/// where they overlap older ones.
pub fn create_override(
    conn: &Connection,
    ctx: &CoreContext,
    actor: &Actor,
    franchise_id: i64,
    start: NaiveDate,
    end: NaiveDate,
    reason: Option<&str>,
) -> AppResult<PayPeriodOverride> {
    actor.ensure_admin()?;
    if start > end {
        return Err(AppError::Validation(format!(
            "override start {start} is after its end {end}"
        )));
    }

    let reason = reason.map(str::trim).filter(|r| !r.is_empty());
    let now = ctx.now();
    let id = settings::insert_override(conn, franchise_id, start, end, reason, now)?;
    info!(franchise_id, override_id = id, %start, %end, "pay period override created");

    Ok(PayPeriodOverride {
        id,
        franchise_id,
        start_date: start,
        end_date: end,
        reason: reason.map(String::from),
        created_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn biweekly_uses_anchor_multiples() {
        let anchor = d(2024, 1, 1);
        assert_eq!(
            compute_window(PeriodType::Biweekly, d(2024, 1, 20), anchor),
            (d(2024, 1, 15), d(2024, 1, 28))
        );
        assert_eq!(
            compute_window(PeriodType::Biweekly, d(2024, 1, 14), anchor),
            (d(2024, 1, 1), d(2024, 1, 14))
        );
        // before the anchor still lands on the 14-day grid
        assert_eq!(
            compute_window(PeriodType::Biweekly, d(2023, 12, 31), anchor),
            (d(2023, 12, 18), d(2023, 12, 31))
        );
    }

    #[test]
    fn weekly_is_monday_aligned() {
        // 2026-01-07 is a Wednesday
        assert_eq!(
            compute_window(PeriodType::Weekly, d(2026, 1, 7), d(2024, 1, 1)),
            (d(2026, 1, 5), d(2026, 1, 11))
        );
        assert_eq!(
            compute_window(PeriodType::Weekly, d(2026, 1, 11), d(2024, 1, 1)),
            (d(2026, 1, 5), d(2026, 1, 11))
        );
    }

    #[test]
    fn semimonthly_splits_on_the_fifteenth() {
        let a = d(2024, 1, 1);
        assert_eq!(
            compute_window(PeriodType::Semimonthly, d(2024, 2, 15), a),
            (d(2024, 2, 1), d(2024, 2, 15))
        );
        assert_eq!(
            compute_window(PeriodType::Semimonthly, d(2024, 2, 16), a),
            (d(2024, 2, 16), d(2024, 2, 29))
        );
        assert_eq!(
            compute_window(PeriodType::Semimonthly, d(2023, 2, 20), a),
            (d(2023, 2, 16), d(2023, 2, 28))
        );
    }

    #[test]
    fn monthly_is_calendar_month() {
        assert_eq!(
            compute_window(PeriodType::Monthly, d(2026, 12, 31), d(2024, 1, 1)),
            (d(2026, 12, 1), d(2026, 12, 31))
        );
    }

    #[test]
    fn consecutive_periods_tile_in_utc() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let anchor = d(2024, 1, 1);

        for pt in [
            PeriodType::Weekly,
            PeriodType::Biweekly,
            PeriodType::Semimonthly,
            PeriodType::Monthly,
        ] {
            // walk across the March DST change
            let mut date = d(2026, 2, 1);
            let mut prev_end: Option<DateTime<Utc>> = None;
            while date < d(2026, 5, 1) {
                let (s, e) = compute_window(pt, date, anchor);
                let (start_at, end_at) = utc_bounds(&tz, s, e);
                if let Some(pe) = prev_end {
                    assert_eq!(pe, start_at, "{pt:?} gap/overlap at {s}");
                }
                assert!(end_at > start_at);
                prev_end = Some(end_at);
                date = e + Duration::days(1);
            }
        }
    }

    #[test]
    fn utc_bounds_follow_local_midnight() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let (start, end) = utc_bounds(&tz, d(2024, 1, 15), d(2024, 1, 28));
        assert_eq!(start.to_rfc3339(), "2024-01-15T05:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2024-01-29T05:00:00+00:00");
    }

    #[test]
    fn bad_settings_fall_back_to_defaults() {
        let ctx = CoreContext::default();
        let stored = FranchiseSettings {
            franchise_id: 1,
            timezone: Some("Not/AZone".into()),
            period_type: Some("fortnightly-ish".into()),
            biweekly_anchor: None,
        };
        let eff = effective_settings(Some(&stored), &ctx);
        assert_eq!(eff.timezone, ctx.default_timezone);
        assert_eq!(eff.period_type, ctx.default_period_type);
        assert_eq!(eff.biweekly_anchor, d(2024, 1, 1));

        let eff = effective_settings(None, &ctx);
        assert_eq!(eff.period_type, PeriodType::Biweekly);
    }
}
