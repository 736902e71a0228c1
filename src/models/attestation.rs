use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// A tutor's typed-name acknowledgment for one closed Sunday–Saturday week.
/// Append-only; unique per (franchise_id, tutor_id, week_end).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyAttestation {
    pub id: i64,
    pub franchise_id: i64,
    pub tutor_id: i64,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub timezone: String,
    pub typed_name: String,
    pub signed_at: DateTime<Utc>,
    pub attestation_text: String,
    pub attestation_version: String,
    pub metadata: serde_json::Value,
}

/// Input for recording a new attestation.
#[derive(Debug, Clone)]
pub struct NewAttestation {
    pub franchise_id: i64,
    pub tutor_id: i64,
    pub week_end: NaiveDate,
    pub typed_name: String,
    pub attestation_text: String,
    pub attestation_version: String,
    pub metadata: serde_json::Value,
}
