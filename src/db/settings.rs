//! Franchise payroll settings and pay-period overrides.

use crate::db::db_utils::{date_to_db, get_date, get_opt_date, get_ts, ts_to_db};
use crate::errors::AppResult;
use crate::models::pay_period::{FranchiseSettings, PayPeriodOverride};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

fn map_settings(row: &Row) -> rusqlite::Result<FranchiseSettings> {
    Ok(FranchiseSettings {
        franchise_id: row.get("franchise_id")?,
        timezone: row.get("timezone")?,
        period_type: row.get("period_type")?,
        // a junk anchor is treated like a missing one
        biweekly_anchor: get_opt_date(row, "biweekly_anchor").unwrap_or(None),
    })
}

fn map_override(row: &Row) -> rusqlite::Result<PayPeriodOverride> {
    Ok(PayPeriodOverride {
        id: row.get("id")?,
        franchise_id: row.get("franchise_id")?,
        start_date: get_date(row, "start_date")?,
        end_date: get_date(row, "end_date")?,
        reason: row.get("reason")?,
        created_at: get_ts(row, "created_at")?,
    })
}

pub fn load_franchise_settings(
    conn: &Connection,
    franchise_id: i64,
) -> AppResult<Option<FranchiseSettings>> {
    let mut stmt = conn.prepare_cached(
        "SELECT franchise_id, timezone, period_type, biweekly_anchor
         FROM franchise_settings WHERE franchise_id = ?1",
    )?;
    Ok(stmt.query_row([franchise_id], map_settings).optional()?)
}

/// Insert or replace a franchise's settings row. Values are stored as given;
/// validation happens when they are used.
pub fn upsert_franchise_settings(
    conn: &Connection,
    settings: &FranchiseSettings,
    now: DateTime<Utc>,
) -> AppResult<()> {
    conn.execute(
        "INSERT INTO franchise_settings (franchise_id, timezone, period_type, biweekly_anchor, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(franchise_id) DO UPDATE SET
            timezone = excluded.timezone,
            period_type = excluded.period_type,
            biweekly_anchor = excluded.biweekly_anchor,
            updated_at = excluded.updated_at",
        params![
            settings.franchise_id,
            settings.timezone,
            settings.period_type,
            settings.biweekly_anchor.as_ref().map(date_to_db),
            ts_to_db(&now),
        ],
    )?;
    Ok(())
}

/// Most recently created override whose inclusive range contains `date`.
pub fn find_override_containing(
    conn: &Connection,
    franchise_id: i64,
    date: NaiveDate,
) -> AppResult<Option<PayPeriodOverride>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, franchise_id, start_date, end_date, reason, created_at
         FROM pay_period_overrides
         WHERE franchise_id = ?1 AND start_date <= ?2 AND end_date >= ?2
         ORDER BY created_at DESC, id DESC
         LIMIT 1",
    )?;
    Ok(stmt
        .query_row(params![franchise_id, date_to_db(&date)], map_override)
        .optional()?)
}

pub fn insert_override(
    conn: &Connection,
    franchise_id: i64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO pay_period_overrides (franchise_id, start_date, end_date, reason, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            franchise_id,
            date_to_db(&start_date),
            date_to_db(&end_date),
            reason,
            ts_to_db(&now),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_overrides(conn: &Connection, franchise_id: i64) -> AppResult<Vec<PayPeriodOverride>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, franchise_id, start_date, end_date, reason, created_at
         FROM pay_period_overrides
         WHERE franchise_id = ?1
         ORDER BY start_date ASC, id ASC",
    )?;
    let rows = stmt.query_map([franchise_id], map_override)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
