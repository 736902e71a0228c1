//! Half-open `[start, end)` intervals over epoch minutes.
//!
//! Every timestamp entering this module must carry an explicit UTC offset
//! and sit exactly on a minute boundary. Nothing is ever rounded: a value
//! that is off by one second is rejected.

use crate::models::time_range::TimeRange;
use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, Timelike, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntervalError {
    #[error("unparsable timestamp '{0}'")]
    Unparsable(String),

    #[error("timestamp '{0}' has no UTC offset")]
    MissingOffset(String),

    #[error("timestamp '{0}' is not aligned to a whole minute")]
    NotMinuteAligned(String),

    #[error("interval {start} – {end} has zero length")]
    ZeroLength { start: String, end: String },

    #[error("interval {start} – {end} ends before it starts")]
    Inverted { start: String, end: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MinuteInterval {
    pub start: i64,
    pub end: i64,
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an RFC 3339 timestamp into epoch minutes.
pub fn parse_epoch_minutes(raw: &str) -> Result<i64, IntervalError> {
    let s = raw.trim();

    let parsed: Option<DateTime<FixedOffset>> = DateTime::parse_from_rfc3339(s)
        .ok()
        .or_else(|| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M%:z").ok());

    match parsed {
        Some(dt) => {
            if dt.timestamp().rem_euclid(60) != 0 || dt.nanosecond() != 0 {
                return Err(IntervalError::NotMinuteAligned(raw.to_string()));
            }
            Ok(dt.timestamp().div_euclid(60))
        }
        None => {
            let naive = NAIVE_FORMATS
                .iter()
                .any(|fmt| NaiveDateTime::parse_from_str(s, fmt).is_ok());
            if naive {
                Err(IntervalError::MissingOffset(raw.to_string()))
            } else {
                Err(IntervalError::Unparsable(raw.to_string()))
            }
        }
    }
}

pub fn utc_from_minutes(minutes: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(minutes * 60, 0).unwrap_or_default()
}

impl MinuteInterval {
    pub fn new(start: i64, end: i64) -> Result<Self, IntervalError> {
        if end == start {
            return Err(IntervalError::ZeroLength {
                start: utc_from_minutes(start).to_rfc3339(),
                end: utc_from_minutes(end).to_rfc3339(),
            });
        }
        if end < start {
            return Err(IntervalError::Inverted {
                start: utc_from_minutes(start).to_rfc3339(),
                end: utc_from_minutes(end).to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, IntervalError> {
        let s = parse_epoch_minutes(start)?;
        let e = parse_epoch_minutes(end)?;
        if e == s {
            return Err(IntervalError::ZeroLength {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        if e < s {
            return Err(IntervalError::Inverted {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start: s, end: e })
    }

    pub fn from_range(range: &TimeRange) -> Result<Self, IntervalError> {
        Self::parse(&range.start, &range.end)
    }

    pub fn minutes(&self) -> i64 {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &MinuteInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// UTC wire form, e.g. `2026-01-05T14:00:00Z`.
    pub fn to_range(&self) -> TimeRange {
        TimeRange::new(
            utc_from_minutes(self.start).to_rfc3339_opts(SecondsFormat::Secs, true),
            utc_from_minutes(self.end).to_rfc3339_opts(SecondsFormat::Secs, true),
        )
    }
}

impl fmt::Display for MinuteInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.to_range();
        write!(f, "[{}, {})", r.start, r.end)
    }
}

/// Canonical union: sorted, with touching or overlapping runs merged.
pub fn normalize(list: &[MinuteInterval]) -> Vec<MinuteInterval> {
    let mut sorted = list.to_vec();
    sorted.sort();

    let mut out: Vec<MinuteInterval> = Vec::with_capacity(sorted.len());
    for iv in sorted {
        match out.last_mut() {
            Some(cur) if iv.start <= cur.end => {
                cur.end = cur.end.max(iv.end);
            }
            _ => out.push(iv),
        }
    }
    out
}

pub fn total_minutes(list: &[MinuteInterval]) -> i64 {
    list.iter().map(MinuteInterval::minutes).sum()
}

/// Coverage equality. Same total minutes over different time is not equal.
pub fn equals(a: &[MinuteInterval], b: &[MinuteInterval]) -> bool {
    normalize(a) == normalize(b)
}

/// Minutes of `a` not covered by `b`, as a canonical list.
pub fn subtract(a: &[MinuteInterval], b: &[MinuteInterval]) -> Vec<MinuteInterval> {
    let a = normalize(a);
    let b = normalize(b);

    let mut out = Vec::new();
    let mut j = 0;

    for iv in a {
        let mut cursor = iv.start;

        while j < b.len() && b[j].end <= cursor {
            j += 1;
        }

        let mut k = j;
        while k < b.len() && b[k].start < iv.end {
            if b[k].start > cursor {
                out.push(MinuteInterval {
                    start: cursor,
                    end: b[k].start,
                });
            }
            cursor = cursor.max(b[k].end);
            if cursor >= iv.end {
                break;
            }
            k += 1;
        }

        if cursor < iv.end {
            out.push(MinuteInterval {
                start: cursor,
                end: iv.end,
            });
        }
    }

    out
}

/// Common coverage of `a` and `b`, two-pointer sweep over canonical inputs.
pub fn intersect(a: &[MinuteInterval], b: &[MinuteInterval]) -> Vec<MinuteInterval> {
    let a = normalize(a);
    let b = normalize(b);

    let (mut i, mut j) = (0, 0);
    let mut out = Vec::new();

    while i < a.len() && j < b.len() {
        let start = a[i].start.max(b[j].start);
        let end = a[i].end.min(b[j].end);
        if start < end {
            out.push(MinuteInterval { start, end });
        }
        if a[i].end < b[j].end {
            i += 1;
        } else {
            j += 1;
        }
    }

    out
}

pub fn overlap_minutes(a: &[MinuteInterval], b: &[MinuteInterval]) -> i64 {
    total_minutes(&intersect(a, b))
}

/// First pair (by input position) of intervals that share at least one minute.
pub fn find_overlap(list: &[MinuteInterval]) -> Option<(usize, usize)> {
    let mut indexed: Vec<(usize, MinuteInterval)> = list.iter().copied().enumerate().collect();
    indexed.sort_by_key(|(_, iv)| *iv);

    indexed
        .windows(2)
        .find(|w| w[0].1.overlaps(&w[1].1))
        .map(|w| (w[0].0.min(w[1].0), w[0].0.max(w[1].0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(start: i64, end: i64) -> MinuteInterval {
        MinuteInterval { start, end }
    }

    #[test]
    fn parse_rejects_malformed_timestamps() {
        assert!(matches!(
            parse_epoch_minutes("2026-01-05T09:00:30Z"),
            Err(IntervalError::NotMinuteAligned(_))
        ));
        assert!(matches!(
            parse_epoch_minutes("2026-01-05T09:00:00.500Z"),
            Err(IntervalError::NotMinuteAligned(_))
        ));
        assert!(matches!(
            parse_epoch_minutes("2026-01-05T09:00:00"),
            Err(IntervalError::MissingOffset(_))
        ));
        assert!(matches!(
            parse_epoch_minutes("nine o'clock"),
            Err(IntervalError::Unparsable(_))
        ));
    }

    #[test]
    fn parse_honours_offsets() {
        let utc = parse_epoch_minutes("2026-01-05T14:00:00Z").unwrap();
        let est = parse_epoch_minutes("2026-01-05T09:00:00-05:00").unwrap();
        let short = parse_epoch_minutes("2026-01-05T09:00-05:00").unwrap();
        assert_eq!(utc, est);
        assert_eq!(est, short);
    }

    #[test]
    fn parse_rejects_zero_length_and_inverted() {
        assert!(matches!(
            MinuteInterval::parse("2026-01-05T09:00:00Z", "2026-01-05T09:00:00Z"),
            Err(IntervalError::ZeroLength { .. })
        ));
        assert!(matches!(
            MinuteInterval::parse("2026-01-05T10:00:00Z", "2026-01-05T09:00:00Z"),
            Err(IntervalError::Inverted { .. })
        ));
    }

    #[test]
    fn normalize_merges_touching_and_overlapping() {
        let out = normalize(&[iv(30, 60), iv(0, 30), iv(50, 90), iv(120, 130)]);
        assert_eq!(out, vec![iv(0, 90), iv(120, 130)]);
    }

    #[test]
    fn normalize_is_idempotent_and_never_grows() {
        let input = [iv(10, 20), iv(15, 25), iv(0, 5), iv(5, 8), iv(40, 41)];
        let once = normalize(&input);
        assert_eq!(normalize(&once), once);
        assert!(total_minutes(&once) <= total_minutes(&input));
    }

    #[test]
    fn equals_requires_same_coverage() {
        let a = [iv(0, 60)];
        let b = [iv(0, 30), iv(30, 60)];
        let c = [iv(60, 120)];
        assert!(equals(&a, &b));
        assert!(equals(&b, &a));
        assert!(equals(&a, &a));
        // same total, different time
        assert!(!equals(&a, &c));
        assert!(!equals(&a, &[iv(0, 59)]));
    }

    #[test]
    fn subtract_splits_around_holes() {
        let a = [iv(0, 100)];
        let b = [iv(10, 20), iv(30, 40), iv(90, 200)];
        assert_eq!(subtract(&a, &b), vec![iv(0, 10), iv(20, 30), iv(40, 90)]);
        assert_eq!(subtract(&b, &a), vec![iv(100, 200)]);
        assert!(subtract(&a, &a).is_empty());
    }

    #[test]
    fn subtract_handles_one_b_spanning_several_a() {
        let a = [iv(0, 10), iv(20, 30), iv(40, 50)];
        let b = [iv(5, 45)];
        assert_eq!(subtract(&a, &b), vec![iv(0, 5), iv(45, 50)]);
    }

    #[test]
    fn subtract_plus_intersection_reconstructs_a() {
        let cases: Vec<(Vec<MinuteInterval>, Vec<MinuteInterval>)> = vec![
            (vec![iv(0, 100)], vec![iv(10, 20), iv(50, 150)]),
            (vec![iv(0, 10), iv(20, 30)], vec![iv(5, 25)]),
            (vec![iv(0, 10)], vec![]),
            (vec![], vec![iv(0, 10)]),
            (vec![iv(0, 60), iv(90, 120)], vec![iv(0, 60), iv(90, 120)]),
        ];

        for (a, b) in cases {
            let mut rebuilt = subtract(&a, &b);
            rebuilt.extend(intersect(&a, &b));
            assert_eq!(normalize(&rebuilt), normalize(&a));
            assert_eq!(
                total_minutes(&subtract(&a, &b)) + overlap_minutes(&a, &b),
                total_minutes(&normalize(&a))
            );
        }
    }

    #[test]
    fn overlap_minutes_sweeps_both_lists() {
        let a = [iv(0, 30), iv(60, 90)];
        let b = [iv(15, 75)];
        assert_eq!(overlap_minutes(&a, &b), 30);
        assert_eq!(overlap_minutes(&b, &a), 30);
        assert_eq!(overlap_minutes(&a, &[]), 0);
    }

    #[test]
    fn find_overlap_ignores_touching_sessions() {
        assert_eq!(find_overlap(&[iv(0, 60), iv(60, 120)]), None);
        assert_eq!(find_overlap(&[iv(60, 120), iv(0, 61)]), Some((0, 1)));
    }

    #[test]
    fn to_range_renders_utc() {
        let m = parse_epoch_minutes("2026-01-05T09:00:00-05:00").unwrap();
        let r = iv(m, m + 60).to_range();
        assert_eq!(r.start, "2026-01-05T14:00:00Z");
        assert_eq!(r.end, "2026-01-05T15:00:00Z");
    }
}
