use crate::models::time_range::TimeRange;
use serde::{Deserialize, Serialize};

pub const COMPARISON_VERSION: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSide {
    pub union: Vec<TimeRange>,
    pub total_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonDiffs {
    pub manual_only: Vec<TimeRange>,
    pub scheduled_only: Vec<TimeRange>,
}

/// Persisted outcome of reconciling reported sessions against a snapshot.
/// Stored even when the two sides disagree, for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryComparisonV1 {
    pub version: u8,
    pub matches: bool,
    pub exact_match: bool,
    pub manual: ComparisonSide,
    pub scheduled: ComparisonSide,
    pub diffs: ComparisonDiffs,
}
