// src/export/model.rs

use crate::models::day::DayView;
use crate::models::pay_period::PayPeriod;
use serde::Serialize;

/// One flat row per day, for payroll hand-off.
#[derive(Serialize, Clone, Debug)]
pub struct DayExport {
    pub day_id: i64,
    pub tutor_id: i64,
    pub work_date: String,
    pub status: String,
    pub clock_state: String,
    pub sessions: usize,
    pub worked_minutes: i64,
    pub scheduled_minutes: Option<i64>,
    pub matches: Option<bool>,
    pub submitted_at: Option<String>,
    pub decided_by_type: Option<String>,
    pub decided_at: Option<String>,
}

impl From<&DayView> for DayExport {
    fn from(v: &DayView) -> Self {
        let d = &v.day;
        Self {
            day_id: d.id,
            tutor_id: d.tutor_id,
            work_date: d.work_date.format("%Y-%m-%d").to_string(),
            status: d.status.to_db_str().to_string(),
            clock_state: d.clock_state.to_db_str().to_string(),
            sessions: v.sessions.iter().filter(|s| !s.is_open()).count(),
            worked_minutes: v.worked_minutes(),
            scheduled_minutes: d.comparison.as_ref().map(|c| c.scheduled.total_minutes),
            matches: d.comparison.as_ref().map(|c| c.matches),
            submitted_at: d.submitted_at.map(|t| t.to_rfc3339()),
            decided_by_type: d.decided_by_type.map(|t| t.to_db_str().to_string()),
            decided_at: d.decided_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// JSON document: the resolved period plus its rows.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PeriodReport<'a> {
    pub pay_period: &'a PayPeriod,
    pub total_worked_minutes: i64,
    pub days: &'a [DayExport],
}
