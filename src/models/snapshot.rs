use crate::models::time_range::TimeRange;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const SNAPSHOT_VERSION: u8 = 1;

/// One posted schedule slot, exactly as the scheduling side hands it over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub slot_id: String,
    pub label: String,
}

/// Signed capture of one tutor's scheduled sessions for one workday.
///
/// `intervals` are franchise-local, unmerged and carry explicit offsets;
/// merging happens only when a comparison is computed. Once `signature` is
/// set the snapshot must be treated as immutable: any field change breaks
/// verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSnapshotV1 {
    pub version: u8,
    pub franchise_id: i64,
    pub tutor_id: i64,
    pub work_date: NaiveDate,
    pub timezone: String,
    pub slot_minutes: i64,
    pub entries: Vec<ScheduleEntry>,
    pub intervals: Vec<TimeRange>,
    pub issued_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl ScheduleSnapshotV1 {
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}
