use super::comparison::TimeEntryComparisonV1;
use super::day_status::{ClockState, DayStatus};
use super::session::TimeEntrySession;
use super::snapshot::ScheduleSnapshotV1;
use crate::models::audit::ActorType;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// One tutor's workday record. Unique per (franchise_id, tutor_id, work_date).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryDay {
    pub id: i64,
    pub franchise_id: i64,
    pub tutor_id: i64,
    pub work_date: NaiveDate, // franchise-local calendar date
    pub timezone: String,
    pub status: DayStatus,
    pub clock_state: ClockState,
    pub schedule_snapshot: Option<ScheduleSnapshotV1>,
    pub comparison: Option<TimeEntryComparisonV1>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub decided_by_type: Option<ActorType>,
    pub decided_by: Option<i64>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decision_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A day together with its sessions, ordered by `sort_order`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayView {
    pub day: TimeEntryDay,
    pub sessions: Vec<TimeEntrySession>,
}

impl DayView {
    pub fn open_session(&self) -> Option<&TimeEntrySession> {
        self.sessions.iter().find(|s| s.is_open())
    }

    pub fn worked_minutes(&self) -> i64 {
        self.sessions.iter().map(|s| s.minutes()).sum()
    }
}
