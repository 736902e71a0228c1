//! Append-only `time_entry_audit_log`. There is no update or delete here.

use crate::db::db_utils::{get_enum, get_ts, ts_to_db};
use crate::errors::AppResult;
use crate::models::audit::{ActorType, AuditAction, AuditLogEntry};
use crate::models::day_status::DayStatus;
use rusqlite::{Connection, Row, params};

fn map_row(row: &Row) -> rusqlite::Result<AuditLogEntry> {
    let previous_status = match row.get::<_, Option<String>>("previous_status")? {
        Some(raw) => DayStatus::from_db_str(&raw),
        None => None,
    };
    let metadata: String = row.get("metadata")?;

    Ok(AuditLogEntry {
        id: row.get("id")?,
        entry_day_id: row.get("entry_day_id")?,
        action: get_enum(row, "action", AuditAction::from_db_str)?,
        actor_account_type: get_enum(row, "actor_account_type", ActorType::from_db_str)?,
        actor_account_id: row.get("actor_account_id")?,
        at: get_ts(row, "at")?,
        previous_status,
        new_status: get_enum(row, "new_status", DayStatus::from_db_str)?,
        metadata: serde_json::from_str(&metadata).unwrap_or(serde_json::Value::Null),
    })
}

pub fn insert(conn: &Connection, entry: &AuditLogEntry) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO time_entry_audit_log
            (entry_day_id, action, actor_account_type, actor_account_id, at,
             previous_status, new_status, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            entry.entry_day_id,
            entry.action.to_db_str(),
            entry.actor_account_type.to_db_str(),
            entry.actor_account_id,
            ts_to_db(&entry.at),
            entry.previous_status.map(|s| s.to_db_str()),
            entry.new_status.to_db_str(),
            serde_json::to_string(&entry.metadata)?,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Entries of one day in the order they were written.
pub fn list_for_day(conn: &Connection, day_id: i64) -> AppResult<Vec<AuditLogEntry>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, entry_day_id, action, actor_account_type, actor_account_id, at,
                previous_status, new_status, metadata
         FROM time_entry_audit_log
         WHERE entry_day_id = ?1
         ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([day_id], map_row)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
