use crate::models::time_range::TimeRange;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntrySession {
    pub id: i64,
    pub entry_day_id: i64,     // ⇔ time_entry_sessions.entry_day_id
    pub start_at: DateTime<Utc>, // minute-aligned
    pub end_at: Option<DateTime<Utc>>, // None while clocked in
    pub sort_order: i32,
}

impl TimeEntrySession {
    pub fn is_open(&self) -> bool {
        self.end_at.is_none()
    }

    /// Closed sessions only; an open session has no range yet.
    pub fn to_range(&self) -> Option<TimeRange> {
        self.end_at.map(|end| {
            TimeRange::new(
                self.start_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                end.to_rfc3339_opts(SecondsFormat::Secs, true),
            )
        })
    }

    pub fn minutes(&self) -> i64 {
        self.end_at
            .map(|end| (end - self.start_at).num_minutes())
            .unwrap_or(0)
    }
}

/// A closed session as supplied by a tutor or admin edit, before it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewSession {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl NewSession {
    pub fn to_range(&self) -> TimeRange {
        TimeRange::new(
            self.start_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.end_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        )
    }
}
