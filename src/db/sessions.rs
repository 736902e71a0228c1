//! `time_entry_sessions` queries. Session ordering is by `sort_order`,
//! which always follows `start_at`.

use crate::db::db_utils::{get_opt_ts, get_ts, ts_to_db};
use crate::errors::AppResult;
use crate::models::session::{NewSession, TimeEntrySession};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

fn map_row(row: &Row) -> rusqlite::Result<TimeEntrySession> {
    Ok(TimeEntrySession {
        id: row.get("id")?,
        entry_day_id: row.get("entry_day_id")?,
        start_at: get_ts(row, "start_at")?,
        end_at: get_opt_ts(row, "end_at")?,
        sort_order: row.get("sort_order")?,
    })
}

pub fn list_for_day(conn: &Connection, day_id: i64) -> AppResult<Vec<TimeEntrySession>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, entry_day_id, start_at, end_at, sort_order
         FROM time_entry_sessions
         WHERE entry_day_id = ?1
         ORDER BY sort_order ASC, start_at ASC",
    )?;
    let rows = stmt.query_map([day_id], map_row)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// The tutor's open session on any day of the franchise, if one exists.
pub fn find_open_for_tutor(
    conn: &Connection,
    franchise_id: i64,
    tutor_id: i64,
) -> AppResult<Option<TimeEntrySession>> {
    let mut stmt = conn.prepare_cached(
        "SELECT s.id, s.entry_day_id, s.start_at, s.end_at, s.sort_order
         FROM time_entry_sessions s
         JOIN time_entry_days d ON d.id = s.entry_day_id
         WHERE d.franchise_id = ?1 AND d.tutor_id = ?2 AND s.end_at IS NULL
         ORDER BY s.start_at DESC
         LIMIT 1",
    )?;
    Ok(stmt
        .query_row(params![franchise_id, tutor_id], map_row)
        .optional()?)
}

fn next_sort_order(conn: &Connection, day_id: i64) -> AppResult<i32> {
    let max: Option<i32> = conn.query_row(
        "SELECT MAX(sort_order) FROM time_entry_sessions WHERE entry_day_id = ?1",
        [day_id],
        |row| row.get(0),
    )?;
    Ok(max.map(|m| m + 1).unwrap_or(0))
}

pub fn insert_open(conn: &Connection, day_id: i64, start_at: DateTime<Utc>) -> AppResult<i64> {
    let sort_order = next_sort_order(conn, day_id)?;
    conn.execute(
        "INSERT INTO time_entry_sessions (entry_day_id, start_at, end_at, sort_order)
         VALUES (?1, ?2, NULL, ?3)",
        params![day_id, ts_to_db(&start_at), sort_order],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn close(conn: &Connection, session_id: i64, end_at: DateTime<Utc>) -> AppResult<()> {
    conn.execute(
        "UPDATE time_entry_sessions SET end_at = ?2 WHERE id = ?1",
        params![session_id, ts_to_db(&end_at)],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, session_id: i64) -> AppResult<()> {
    conn.execute("DELETE FROM time_entry_sessions WHERE id = ?1", [session_id])?;
    Ok(())
}

/// Replace every session of a day with `sessions`, renumbered by start time.
pub fn replace_all(conn: &Connection, day_id: i64, sessions: &[NewSession]) -> AppResult<()> {
    conn.execute(
        "DELETE FROM time_entry_sessions WHERE entry_day_id = ?1",
        [day_id],
    )?;

    let mut sorted = sessions.to_vec();
    sorted.sort_by_key(|s| s.start_at);

    let mut stmt = conn.prepare_cached(
        "INSERT INTO time_entry_sessions (entry_day_id, start_at, end_at, sort_order)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (i, s) in sorted.iter().enumerate() {
        stmt.execute(params![
            day_id,
            ts_to_db(&s.start_at),
            ts_to_db(&s.end_at),
            i as i32
        ])?;
    }
    Ok(())
}
