//! Instant parsing and local clock rendering for the CLI.

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};

/// Parse an RFC 3339 instant (explicit offset required) without rounding.
pub fn parse_instant(raw: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::InvalidTime(raw.to_string()))
}

/// `HH:MM` of `ts` in the named timezone, falling back to UTC.
pub fn local_hhmm(ts: &DateTime<Utc>, timezone: &str) -> String {
    match timezone.parse::<chrono_tz::Tz>() {
        Ok(tz) => ts.with_timezone(&tz).format("%H:%M").to_string(),
        Err(_) => ts.format("%H:%MZ").to_string(),
    }
}
