//! Row-mapping helpers shared by the query modules.
//! Timestamps are stored as RFC 3339 UTC text, dates as `YYYY-MM-DD`.

use crate::errors::AppError;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::Type;

pub fn ts_to_db(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn date_to_db(d: &NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

fn conversion_error(idx: usize, err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub fn parse_ts(raw: &str, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| conversion_error(idx, AppError::InvalidTime(raw.to_string())))
}

pub fn get_ts(row: &Row, name: &str) -> rusqlite::Result<DateTime<Utc>> {
    let idx = row.as_ref().column_index(name)?;
    let raw: String = row.get(idx)?;
    parse_ts(&raw, idx)
}

pub fn get_opt_ts(row: &Row, name: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let idx = row.as_ref().column_index(name)?;
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => parse_ts(&raw, idx).map(Some),
        None => Ok(None),
    }
}

pub fn get_date(row: &Row, name: &str) -> rusqlite::Result<NaiveDate> {
    let idx = row.as_ref().column_index(name)?;
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|_| conversion_error(idx, AppError::InvalidDate(raw.clone())))
}

pub fn get_opt_date(row: &Row, name: &str) -> rusqlite::Result<Option<NaiveDate>> {
    let idx = row.as_ref().column_index(name)?;
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| conversion_error(idx, AppError::InvalidDate(raw.clone()))),
        None => Ok(None),
    }
}

/// Decode an optional JSON column into `T`.
pub fn get_opt_json<T: serde::de::DeserializeOwned>(
    row: &Row,
    name: &str,
) -> rusqlite::Result<Option<T>> {
    let idx = row.as_ref().column_index(name)?;
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| conversion_error(idx, AppError::Json(e))),
        None => Ok(None),
    }
}

/// Decode a TEXT enum column with the model's `from_db_str`.
pub fn get_enum<T>(row: &Row, name: &str, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let idx = row.as_ref().column_index(name)?;
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| {
        conversion_error(idx, AppError::Other(format!("invalid value '{raw}' in {name}")))
    })
}

/// Nullable variant of [`get_enum`]; an unknown value is still an error.
pub fn get_opt_enum<T>(
    row: &Row,
    name: &str,
    parse: fn(&str) -> Option<T>,
) -> rusqlite::Result<Option<T>> {
    let idx = row.as_ref().column_index(name)?;
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => parse(&raw).map(Some).ok_or_else(|| {
            conversion_error(idx, AppError::Other(format!("invalid value '{raw}' in {name}")))
        }),
        None => Ok(None),
    }
}
