//! `time_entry_days` queries.

use crate::db::db_utils::{
    date_to_db, get_date, get_enum, get_opt_enum, get_opt_json, get_opt_ts, get_ts, ts_to_db,
};
use crate::errors::AppResult;
use crate::models::audit::ActorType;
use crate::models::day::TimeEntryDay;
use crate::models::day_status::{ClockState, DayStatus};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

const DAY_COLUMNS: &str = "id, franchise_id, tutor_id, work_date, timezone, status, clock_state,
     schedule_snapshot, comparison, submitted_at, decided_by_type, decided_by,
     decided_at, decision_reason, created_at, updated_at";

fn map_row(row: &Row) -> rusqlite::Result<TimeEntryDay> {
    Ok(TimeEntryDay {
        id: row.get("id")?,
        franchise_id: row.get("franchise_id")?,
        tutor_id: row.get("tutor_id")?,
        work_date: get_date(row, "work_date")?,
        timezone: row.get("timezone")?,
        status: get_enum(row, "status", DayStatus::from_db_str)?,
        clock_state: get_enum(row, "clock_state", ClockState::from_db_str)?,
        schedule_snapshot: get_opt_json(row, "schedule_snapshot")?,
        comparison: get_opt_json(row, "comparison")?,
        submitted_at: get_opt_ts(row, "submitted_at")?,
        decided_by_type: get_opt_enum(row, "decided_by_type", ActorType::from_db_str)?,
        decided_by: row.get("decided_by")?,
        decided_at: get_opt_ts(row, "decided_at")?,
        decision_reason: row.get("decision_reason")?,
        created_at: get_ts(row, "created_at")?,
        updated_at: get_ts(row, "updated_at")?,
    })
}

pub fn find_day(
    conn: &Connection,
    franchise_id: i64,
    tutor_id: i64,
    work_date: NaiveDate,
) -> AppResult<Option<TimeEntryDay>> {
    let sql = format!(
        "SELECT {DAY_COLUMNS} FROM time_entry_days
         WHERE franchise_id = ?1 AND tutor_id = ?2 AND work_date = ?3"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    Ok(stmt
        .query_row(
            params![franchise_id, tutor_id, date_to_db(&work_date)],
            map_row,
        )
        .optional()?)
}

pub fn find_day_by_id(conn: &Connection, id: i64) -> AppResult<Option<TimeEntryDay>> {
    let sql = format!("SELECT {DAY_COLUMNS} FROM time_entry_days WHERE id = ?1");
    let mut stmt = conn.prepare_cached(&sql)?;
    Ok(stmt.query_row([id], map_row).optional()?)
}

/// Insert a fresh draft day and return its id.
pub fn insert_day(
    conn: &Connection,
    franchise_id: i64,
    tutor_id: i64,
    work_date: NaiveDate,
    timezone: &str,
    now: DateTime<Utc>,
) -> AppResult<i64> {
    let now = ts_to_db(&now);
    conn.execute(
        "INSERT INTO time_entry_days
            (franchise_id, tutor_id, work_date, timezone, status, clock_state, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, 'draft', 'clocked_out', ?5, ?5)",
        params![franchise_id, tutor_id, date_to_db(&work_date), timezone, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Persist every mutable column of `day`.
pub fn update_day(conn: &Connection, day: &TimeEntryDay) -> AppResult<()> {
    let snapshot = day
        .schedule_snapshot
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let comparison = day
        .comparison
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    conn.execute(
        "UPDATE time_entry_days SET
            status = ?2,
            clock_state = ?3,
            schedule_snapshot = ?4,
            comparison = ?5,
            submitted_at = ?6,
            decided_by_type = ?7,
            decided_by = ?8,
            decided_at = ?9,
            decision_reason = ?10,
            updated_at = ?11
         WHERE id = ?1",
        params![
            day.id,
            day.status.to_db_str(),
            day.clock_state.to_db_str(),
            snapshot,
            comparison,
            day.submitted_at.as_ref().map(ts_to_db),
            day.decided_by_type.map(|t| t.to_db_str()),
            day.decided_by,
            day.decided_at.as_ref().map(ts_to_db),
            day.decision_reason,
            ts_to_db(&day.updated_at),
        ],
    )?;
    Ok(())
}

/// Days of a franchise whose local work date lies in `[start, end]`.
pub fn list_days_in_range(
    conn: &Connection,
    franchise_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<Vec<TimeEntryDay>> {
    let sql = format!(
        "SELECT {DAY_COLUMNS} FROM time_entry_days
         WHERE franchise_id = ?1 AND work_date >= ?2 AND work_date <= ?3
         ORDER BY work_date ASC, tutor_id ASC"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map(
        params![franchise_id, date_to_db(&start), date_to_db(&end)],
        map_row,
    )?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
