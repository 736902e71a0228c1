//! Reconciliation of reported sessions against scheduled intervals.
//!
//! `compute` is the only code path allowed to decide an automatic approval:
//! the day is auto-approved iff `matches` is true.

use crate::core::interval::{self, IntervalError, MinuteInterval};
use crate::models::comparison::{
    COMPARISON_VERSION, ComparisonDiffs, ComparisonSide, TimeEntryComparisonV1,
};
use crate::models::time_range::TimeRange;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComparisonError {
    #[error("reported session #{index} is malformed: {source}")]
    InvalidManual {
        index: usize,
        #[source]
        source: IntervalError,
    },

    #[error("scheduled interval #{index} is malformed: {source}")]
    InvalidScheduled {
        index: usize,
        #[source]
        source: IntervalError,
    },
}

fn parse_side(
    ranges: &[TimeRange],
    wrap: fn(usize, IntervalError) -> ComparisonError,
) -> Result<Vec<MinuteInterval>, ComparisonError> {
    ranges
        .iter()
        .enumerate()
        .map(|(i, r)| MinuteInterval::from_range(r).map_err(|e| wrap(i, e)))
        .collect()
}

fn to_ranges(list: &[MinuteInterval]) -> Vec<TimeRange> {
    list.iter().map(MinuteInterval::to_range).collect()
}

/// Compare manual sessions with scheduled intervals.
///
/// Both sides are validated first (minute-aligned, explicit offset,
/// positive length). The result is meant to be persisted whether or not
/// the two sides match.
pub fn compute(
    sessions: &[TimeRange],
    schedule: &[TimeRange],
) -> Result<TimeEntryComparisonV1, ComparisonError> {
    let manual = parse_side(sessions, |index, source| ComparisonError::InvalidManual {
        index,
        source,
    })?;
    let scheduled = parse_side(schedule, |index, source| {
        ComparisonError::InvalidScheduled { index, source }
    })?;

    let manual_union = interval::normalize(&manual);
    let scheduled_union = interval::normalize(&scheduled);

    let matches = manual_union == scheduled_union;
    let manual_only = interval::subtract(&manual_union, &scheduled_union);
    let scheduled_only = interval::subtract(&scheduled_union, &manual_union);

    Ok(TimeEntryComparisonV1 {
        version: COMPARISON_VERSION,
        matches,
        exact_match: matches,
        manual: ComparisonSide {
            total_minutes: interval::total_minutes(&manual_union),
            union: to_ranges(&manual_union),
        },
        scheduled: ComparisonSide {
            total_minutes: interval::total_minutes(&scheduled_union),
            union: to_ranges(&scheduled_union),
        },
        diffs: ComparisonDiffs {
            manual_only: to_ranges(&manual_only),
            scheduled_only: to_ranges(&scheduled_only),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(start: &str, end: &str) -> TimeRange {
        TimeRange::new(start, end)
    }

    #[test]
    fn split_schedule_matches_one_session() {
        let sessions = [r("2026-01-05T09:00:00-05:00", "2026-01-05T10:00:00-05:00")];
        let schedule = [
            r("2026-01-05T09:00:00-05:00", "2026-01-05T09:30:00-05:00"),
            r("2026-01-05T09:30:00-05:00", "2026-01-05T10:00:00-05:00"),
        ];

        let cmp = compute(&sessions, &schedule).unwrap();
        assert!(cmp.matches);
        assert!(cmp.exact_match);
        assert!(cmp.diffs.manual_only.is_empty());
        assert!(cmp.diffs.scheduled_only.is_empty());
        assert_eq!(cmp.manual.total_minutes, 60);
        assert_eq!(cmp.scheduled.total_minutes, 60);
    }

    #[test]
    fn overtime_shows_up_as_manual_only() {
        let sessions = [r("2026-01-05T14:00:00Z", "2026-01-05T15:30:00Z")];
        let schedule = [r("2026-01-05T09:00:00-05:00", "2026-01-05T10:00:00-05:00")];

        let cmp = compute(&sessions, &schedule).unwrap();
        assert!(!cmp.matches);
        assert_eq!(
            cmp.diffs.manual_only,
            vec![r("2026-01-05T15:00:00Z", "2026-01-05T15:30:00Z")]
        );
        assert!(cmp.diffs.scheduled_only.is_empty());
        assert_eq!(cmp.manual.total_minutes, 90);
        assert_eq!(cmp.scheduled.total_minutes, 60);
    }

    #[test]
    fn matching_ignores_order_and_duplicates() {
        let sessions = [
            r("2026-01-05T15:00:00Z", "2026-01-05T16:00:00Z"),
            r("2026-01-05T14:00:00Z", "2026-01-05T15:00:00Z"),
        ];
        let schedule = [
            r("2026-01-05T14:00:00Z", "2026-01-05T16:00:00Z"),
            r("2026-01-05T14:30:00Z", "2026-01-05T15:30:00Z"),
            r("2026-01-05T14:00:00Z", "2026-01-05T16:00:00Z"),
        ];
        assert!(compute(&sessions, &schedule).unwrap().matches);
    }

    #[test]
    fn same_total_different_time_does_not_match() {
        let sessions = [r("2026-01-05T14:00:00Z", "2026-01-05T15:00:00Z")];
        let schedule = [r("2026-01-05T16:00:00Z", "2026-01-05T17:00:00Z")];

        let cmp = compute(&sessions, &schedule).unwrap();
        assert!(!cmp.matches);
        assert_eq!(cmp.manual.total_minutes, cmp.scheduled.total_minutes);
        assert_eq!(cmp.diffs.manual_only.len(), 1);
        assert_eq!(cmp.diffs.scheduled_only.len(), 1);
    }

    #[test]
    fn empty_on_both_sides_matches() {
        let cmp = compute(&[], &[]).unwrap();
        assert!(cmp.matches);
        assert_eq!(cmp.manual.total_minutes, 0);
    }

    #[test]
    fn malformed_side_is_identified() {
        let good = [r("2026-01-05T14:00:00Z", "2026-01-05T15:00:00Z")];
        let naive = [r("2026-01-05T14:00:00", "2026-01-05T15:00:00Z")];
        let seconds = [
            r("2026-01-05T14:00:00Z", "2026-01-05T15:00:00Z"),
            r("2026-01-05T16:00:10Z", "2026-01-05T17:00:00Z"),
        ];

        assert!(matches!(
            compute(&naive, &good),
            Err(ComparisonError::InvalidManual {
                index: 0,
                source: IntervalError::MissingOffset(_)
            })
        ));
        assert!(matches!(
            compute(&good, &seconds),
            Err(ComparisonError::InvalidScheduled {
                index: 1,
                source: IntervalError::NotMinuteAligned(_)
            })
        ));
    }
}
