use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Weekly,
    Biweekly,
    Semimonthly,
    Monthly,
}

impl PeriodType {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PeriodType::Weekly => "weekly",
            PeriodType::Biweekly => "biweekly",
            PeriodType::Semimonthly => "semimonthly",
            PeriodType::Monthly => "monthly",
        }
    }

    /// Case-insensitive, accepts the common "bi-weekly"/"semi-monthly" spellings.
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "weekly" => Some(PeriodType::Weekly),
            "biweekly" => Some(PeriodType::Biweekly),
            "semimonthly" => Some(PeriodType::Semimonthly),
            "monthly" => Some(PeriodType::Monthly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PayPeriodSource {
    Override,
    Computed,
}

/// Franchise payroll settings as stored; every field may be missing or junk.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FranchiseSettings {
    pub franchise_id: i64,
    pub timezone: Option<String>,
    pub period_type: Option<String>,
    pub biweekly_anchor: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayPeriodOverride {
    pub id: i64,
    pub franchise_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Resolved payroll window. `end_at` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayPeriod {
    pub franchise_id: i64,
    pub timezone: String,
    pub period_type: PeriodType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub source: PayPeriodSource,
    pub override_id: Option<i64>,
    pub resolved_for_date: NaiveDate,
}
