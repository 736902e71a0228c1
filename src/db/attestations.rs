use crate::db::db_utils::{date_to_db, get_date, get_ts, ts_to_db};
use crate::errors::AppResult;
use crate::models::attestation::WeeklyAttestation;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};

fn map_row(row: &Row) -> rusqlite::Result<WeeklyAttestation> {
    let metadata: String = row.get("metadata")?;
    Ok(WeeklyAttestation {
        id: row.get("id")?,
        franchise_id: row.get("franchise_id")?,
        tutor_id: row.get("tutor_id")?,
        week_start: get_date(row, "week_start")?,
        week_end: get_date(row, "week_end")?,
        timezone: row.get("timezone")?,
        typed_name: row.get("typed_name")?,
        signed_at: get_ts(row, "signed_at")?,
        attestation_text: row.get("attestation_text")?,
        attestation_version: row.get("attestation_version")?,
        metadata: serde_json::from_str(&metadata).unwrap_or(serde_json::Value::Null),
    })
}

/// Returns a plain rusqlite result so the gate can type the failure itself.
pub fn exists_for_week_end(
    conn: &Connection,
    franchise_id: i64,
    tutor_id: i64,
    week_end: NaiveDate,
) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare_cached(
        "SELECT 1 FROM weekly_attestations
         WHERE franchise_id = ?1 AND tutor_id = ?2 AND week_end = ?3
         LIMIT 1",
    )?;
    Ok(stmt
        .query_row(params![franchise_id, tutor_id, date_to_db(&week_end)], |_| Ok(()))
        .optional()?
        .is_some())
}

pub fn insert(conn: &Connection, att: &WeeklyAttestation) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO weekly_attestations
            (franchise_id, tutor_id, week_start, week_end, timezone, typed_name,
             signed_at, attestation_text, attestation_version, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            att.franchise_id,
            att.tutor_id,
            date_to_db(&att.week_start),
            date_to_db(&att.week_end),
            att.timezone,
            att.typed_name,
            ts_to_db(&att.signed_at),
            att.attestation_text,
            att.attestation_version,
            serde_json::to_string(&att.metadata)?,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_for_tutor(
    conn: &Connection,
    franchise_id: i64,
    tutor_id: i64,
) -> AppResult<Vec<WeeklyAttestation>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM weekly_attestations
         WHERE franchise_id = ?1 AND tutor_id = ?2
         ORDER BY week_end DESC",
    )?;
    let rows = stmt.query_map(params![franchise_id, tutor_id], map_row)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
