//! Schedule snapshots: derivation from posted slot labels, canonical
//! serialization and HMAC-SHA256 signing.

use crate::models::snapshot::{SNAPSHOT_VERSION, ScheduleEntry, ScheduleSnapshotV1};
use crate::models::time_range::TimeRange;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_SLOT_MINUTES: i64 = 60;
/// Slot lengths are accepted in `1..=MAX_SLOT_MINUTES` (one day).
pub const MAX_SLOT_MINUTES: i64 = 24 * 60;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("unknown timezone '{0}'")]
    InvalidTimezone(String),

    #[error("slot length must be between 1 and 1440 minutes, got {0}")]
    InvalidSlotLength(i64),

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u8),

    #[error("snapshot is not signed")]
    MissingSignature,

    #[error("snapshot signature is malformed")]
    MalformedSignature,

    #[error("snapshot signature does not match its contents")]
    SignatureMismatch,

    #[error("signing secret is empty")]
    EmptySecret,

    #[error("snapshot belongs to {0}")]
    ScopeMismatch(String),

    #[error("canonical serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Which tutor/day a snapshot is being derived for.
#[derive(Debug, Clone)]
pub struct SnapshotScope {
    pub franchise_id: i64,
    pub tutor_id: i64,
    pub work_date: NaiveDate,
    pub timezone: String,
}

// ------------------------------------------------
// Label parsing
// ------------------------------------------------

const TIME_FORMATS: &[&str] = &["%I:%M %p", "%I:%M%p", "%H:%M"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

/// Normalize a single time token: "9am", "9 a.m.", "09:00 PM", "14:30".
fn normalize_token(raw: &str) -> (String, Option<Meridiem>) {
    let mut t = raw.trim().to_uppercase().replace('.', "");
    t = t.split_whitespace().collect::<Vec<_>>().join(" ");

    let meridiem = if t.ends_with("AM") {
        Some(Meridiem::Am)
    } else if t.ends_with("PM") {
        Some(Meridiem::Pm)
    } else {
        None
    };

    let body = match meridiem {
        Some(_) => t[..t.len() - 2].trim().to_string(),
        None => t.clone(),
    };
    let body = if body.contains(':') {
        body
    } else {
        format!("{body}:00")
    };

    (body, meridiem)
}

fn parse_token(body: &str, meridiem: Option<Meridiem>) -> Option<NaiveTime> {
    let candidate = match meridiem {
        Some(Meridiem::Am) => format!("{body} AM"),
        Some(Meridiem::Pm) => format!("{body} PM"),
        None => body.to_string(),
    };
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&candidate, fmt).ok())
}

/// Split "9:00 AM - 10:00 AM" (also "–", "—" or "to") into start and end.
fn split_label(label: &str) -> (String, Option<String>) {
    let unified = label
        .replace(['–', '—'], "-")
        .replace(" to ", "-")
        .replace(" TO ", "-");

    match unified.split_once('-') {
        Some((a, b)) if !b.trim().is_empty() => (a.trim().to_string(), Some(b.trim().to_string())),
        Some((a, _)) => (a.trim().to_string(), None),
        None => (unified.trim().to_string(), None),
    }
}

/// Parse a slot label into local start/end times. An unreadable end is
/// reported as `None`; the caller applies the default slot length.
pub fn parse_slot_label(label: &str) -> Option<(NaiveTime, Option<NaiveTime>)> {
    let (start_raw, end_raw) = split_label(label);

    let (start_body, start_mer) = normalize_token(&start_raw);
    let end_tok = end_raw.as_deref().map(normalize_token);

    // "3:00 - 4:00 PM": the start borrows the end's meridiem
    let start_mer = start_mer.or(end_tok.as_ref().and_then(|(_, m)| *m));

    let start = parse_token(&start_body, start_mer)?;
    let end = end_tok.and_then(|(body, mer)| parse_token(&body, mer.or(start_mer)));

    Some((start, end))
}

fn localize(tz: &Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&date.and_time(time)).earliest()
}

fn render_local(dt: &DateTime<Tz>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Derive franchise-local intervals from raw slots. Slots with an unreadable
/// start, a local time that does not exist, or an end not after the start
/// are dropped. Output keeps input order and is not merged.
pub fn derive_intervals(
    work_date: NaiveDate,
    tz: &Tz,
    slot_minutes: i64,
    entries: &[ScheduleEntry],
) -> Vec<TimeRange> {
    let mut out = Vec::new();

    for entry in entries {
        let Some((start_t, end_t)) = parse_slot_label(&entry.label) else {
            debug!(slot_id = %entry.slot_id, label = %entry.label, "unparsable slot label skipped");
            continue;
        };

        let Some(start) = localize(tz, work_date, start_t) else {
            continue;
        };

        let end = match end_t {
            Some(t) => localize(tz, work_date, t),
            None => Duration::try_minutes(slot_minutes)
                .and_then(|len| start.checked_add_signed(len)),
        };

        match end {
            Some(end) if end > start => out.push(TimeRange::new(render_local(&start), render_local(&end))),
            _ => {
                debug!(slot_id = %entry.slot_id, label = %entry.label, "slot with end before start discarded");
            }
        }
    }

    out
}

/// Build an unsigned snapshot for one tutor/day.
pub fn derive(
    scope: &SnapshotScope,
    slot_minutes: Option<i64>,
    entries: Vec<ScheduleEntry>,
    issued_at: DateTime<Utc>,
) -> Result<ScheduleSnapshotV1, SnapshotError> {
    let tz: Tz = scope
        .timezone
        .parse()
        .map_err(|_| SnapshotError::InvalidTimezone(scope.timezone.clone()))?;

    let slot_minutes = slot_minutes.unwrap_or(DEFAULT_SLOT_MINUTES);
    if !(1..=MAX_SLOT_MINUTES).contains(&slot_minutes) {
        return Err(SnapshotError::InvalidSlotLength(slot_minutes));
    }

    let intervals = derive_intervals(scope.work_date, &tz, slot_minutes, &entries);

    Ok(ScheduleSnapshotV1 {
        version: SNAPSHOT_VERSION,
        franchise_id: scope.franchise_id,
        tutor_id: scope.tutor_id,
        work_date: scope.work_date,
        timezone: scope.timezone.clone(),
        slot_minutes,
        entries,
        intervals,
        issued_at,
        signature: None,
    })
}

// ------------------------------------------------
// Canonical form & signing
// ------------------------------------------------

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// The snapshot minus its signature, serialized with recursively sorted keys.
pub fn canonical_payload(snapshot: &ScheduleSnapshotV1) -> Result<String, SnapshotError> {
    let mut value = serde_json::to_value(snapshot)?;
    if let Value::Object(map) = &mut value {
        map.remove("signature");
    }
    Ok(serde_json::to_string(&sort_keys(value))?)
}

fn mac_for(snapshot: &ScheduleSnapshotV1, secret: &[u8]) -> Result<HmacSha256, SnapshotError> {
    if secret.is_empty() {
        return Err(SnapshotError::EmptySecret);
    }
    let payload = canonical_payload(snapshot)?;
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|_| SnapshotError::EmptySecret)?;
    mac.update(payload.as_bytes());
    Ok(mac)
}

/// Return a copy of `snapshot` carrying a hex HMAC over its canonical form.
pub fn sign(
    snapshot: &ScheduleSnapshotV1,
    secret: &[u8],
) -> Result<ScheduleSnapshotV1, SnapshotError> {
    let mac = mac_for(snapshot, secret)?;
    let mut signed = snapshot.clone();
    signed.signature = Some(hex::encode(mac.finalize().into_bytes()));
    Ok(signed)
}

/// Verify a snapshot against the configured secret.
///
/// With no secret configured signing is off and any snapshot passes. With a
/// secret, a missing or non-matching signature is a terminal failure.
pub fn verify(snapshot: &ScheduleSnapshotV1, secret: Option<&[u8]>) -> Result<(), SnapshotError> {
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(snapshot.version));
    }

    let Some(secret) = secret else {
        return Ok(());
    };

    let sig_hex = snapshot
        .signature
        .as_deref()
        .ok_or(SnapshotError::MissingSignature)?;
    let provided = hex::decode(sig_hex).map_err(|_| SnapshotError::MalformedSignature)?;

    // verify_slice compares in constant time
    mac_for(snapshot, secret)?
        .verify_slice(&provided)
        .map_err(|_| SnapshotError::SignatureMismatch)
}

/// The snapshot must describe exactly the day it is being attached to.
pub fn ensure_scope(
    snapshot: &ScheduleSnapshotV1,
    franchise_id: i64,
    tutor_id: i64,
    work_date: NaiveDate,
) -> Result<(), SnapshotError> {
    if snapshot.franchise_id != franchise_id {
        return Err(SnapshotError::ScopeMismatch(format!(
            "franchise {}, not {franchise_id}",
            snapshot.franchise_id
        )));
    }
    if snapshot.tutor_id != tutor_id {
        return Err(SnapshotError::ScopeMismatch(format!(
            "tutor {}, not {tutor_id}",
            snapshot.tutor_id
        )));
    }
    if snapshot.work_date != work_date {
        return Err(SnapshotError::ScopeMismatch(format!(
            "work date {}, not {work_date}",
            snapshot.work_date
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{AppError, ErrorKind};

    const SECRET: &[u8] = b"franchise-snapshot-secret";

    fn entry(id: &str, label: &str) -> ScheduleEntry {
        ScheduleEntry {
            slot_id: id.to_string(),
            label: label.to_string(),
        }
    }

    fn scope() -> SnapshotScope {
        SnapshotScope {
            franchise_id: 10,
            tutor_id: 42,
            work_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            timezone: "America/New_York".to_string(),
        }
    }

    fn sample() -> ScheduleSnapshotV1 {
        derive(
            &scope(),
            None,
            vec![
                entry("a", "9:00 AM - 10:00 AM"),
                entry("b", "1:30 PM - 2:15 PM"),
            ],
            DateTime::parse_from_rfc3339("2026-01-05T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        )
        .unwrap()
    }

    #[test]
    fn parses_accepted_label_formats() {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        assert_eq!(
            parse_slot_label("9:00 AM - 10:00 AM"),
            Some((t(9, 0), Some(t(10, 0))))
        );
        assert_eq!(parse_slot_label("9am–10am"), Some((t(9, 0), Some(t(10, 0)))));
        assert_eq!(parse_slot_label("14:00 to 15:30"), Some((t(14, 0), Some(t(15, 30)))));
        assert_eq!(parse_slot_label("3:00 - 4:00 p.m."), Some((t(15, 0), Some(t(16, 0)))));
        assert_eq!(parse_slot_label("4:00 PM"), Some((t(16, 0), None)));
        assert_eq!(parse_slot_label("4:00 PM - later"), Some((t(16, 0), None)));
        assert_eq!(parse_slot_label("whenever"), None);
    }

    #[test]
    fn derive_renders_local_offsets_and_defaults_duration() {
        let snap = derive(
            &scope(),
            Some(45),
            vec![entry("a", "9:00 AM - 10:00 AM"), entry("b", "4:00 PM")],
            Utc::now(),
        )
        .unwrap();

        assert_eq!(
            snap.intervals,
            vec![
                TimeRange::new("2026-01-05T09:00:00-05:00", "2026-01-05T10:00:00-05:00"),
                TimeRange::new("2026-01-05T16:00:00-05:00", "2026-01-05T16:45:00-05:00"),
            ]
        );
        assert_eq!(snap.entries.len(), 2);
        assert!(snap.signature.is_none());
    }

    #[test]
    fn derive_discards_inverted_and_unreadable_slots() {
        let snap = derive(
            &scope(),
            None,
            vec![
                entry("a", "10:00 AM - 9:00 AM"),
                entry("b", "noon-ish"),
                entry("c", "11:00 AM - 11:00 AM"),
            ],
            Utc::now(),
        )
        .unwrap();
        assert!(snap.intervals.is_empty());
        assert_eq!(snap.entries.len(), 3);
    }

    #[test]
    fn derive_rejects_unknown_timezone() {
        let mut s = scope();
        s.timezone = "Mars/Olympus".into();
        assert!(matches!(
            derive(&s, None, vec![], Utc::now()),
            Err(SnapshotError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn canonical_payload_sorts_keys_and_drops_signature() {
        let signed = sign(&sample(), SECRET).unwrap();
        let payload = canonical_payload(&signed).unwrap();
        assert!(!payload.contains("signature"));
        let entries_at = payload.find("\"entries\"").unwrap();
        let franchise_at = payload.find("\"franchiseId\"").unwrap();
        let version_at = payload.find("\"version\"").unwrap();
        assert!(entries_at < franchise_at && franchise_at < version_at);
    }

    #[test]
    fn sign_then_verify_round_trips() {
        let signed = sign(&sample(), SECRET).unwrap();
        assert!(verify(&signed, Some(SECRET)).is_ok());
        assert!(matches!(
            verify(&signed, Some(b"other-secret")),
            Err(SnapshotError::SignatureMismatch)
        ));
    }

    #[test]
    fn any_mutated_field_breaks_the_signature() {
        let signed = sign(&sample(), SECRET).unwrap();

        type Snap = ScheduleSnapshotV1;
        let mutations: Vec<fn(&mut Snap)> = vec![
            |s: &mut Snap| s.franchise_id += 1,
            |s: &mut Snap| s.tutor_id += 1,
            |s: &mut Snap| s.work_date = s.work_date.succ_opt().unwrap(),
            |s: &mut Snap| s.timezone = "America/Chicago".into(),
            |s: &mut Snap| s.slot_minutes += 1,
            |s: &mut Snap| s.entries[0].label = "9:00 AM - 11:00 AM".into(),
            |s: &mut Snap| s.intervals[0].end = "2026-01-05T11:00:00-05:00".into(),
            |s: &mut Snap| {
                s.intervals.pop();
            },
            |s: &mut Snap| s.issued_at += Duration::minutes(1),
        ];

        for mutate in mutations {
            let mut tampered = signed.clone();
            mutate(&mut tampered);
            assert!(verify(&tampered, Some(SECRET)).is_err());
        }
    }

    #[test]
    fn unsigned_snapshots_pass_only_without_secret() {
        let unsigned = sample();
        assert!(verify(&unsigned, None).is_ok());
        assert!(matches!(
            verify(&unsigned, Some(SECRET)),
            Err(SnapshotError::MissingSignature)
        ));

        let mut garbled = unsigned.clone();
        garbled.signature = Some("not-hex".into());
        assert!(matches!(
            verify(&garbled, Some(SECRET)),
            Err(SnapshotError::MalformedSignature)
        ));
    }

    #[test]
    fn slot_length_is_bounded_to_one_day() {
        let issued = Utc::now();
        for bad in [0, -5, MAX_SLOT_MINUTES + 1, 1_000_000_000_000] {
            let err = derive(&scope(), Some(bad), vec![entry("a", "9:00 AM")], issued).unwrap_err();
            assert!(matches!(err, SnapshotError::InvalidSlotLength(n) if n == bad));
            assert_eq!(AppError::from(err).kind(), ErrorKind::Validation);
        }

        let snap = derive(&scope(), Some(MAX_SLOT_MINUTES), vec![entry("a", "9:00 AM")], issued)
            .unwrap();
        assert_eq!(
            snap.intervals,
            vec![TimeRange::new("2026-01-05T09:00:00-05:00", "2026-01-06T09:00:00-05:00")]
        );
    }

    #[test]
    fn oversized_slot_is_dropped_instead_of_overflowing() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let out = derive_intervals(date, &tz, i64::MAX, &[entry("a", "9:00 AM")]);
        assert!(out.is_empty());
    }

    #[test]
    fn scope_must_match_the_day() {
        let snap = sample();
        let date = snap.work_date;
        assert!(ensure_scope(&snap, 10, 42, date).is_ok());
        assert!(ensure_scope(&snap, 11, 42, date).is_err());
        assert!(ensure_scope(&snap, 10, 43, date).is_err());
        assert!(ensure_scope(&snap, 10, 42, date.succ_opt().unwrap()).is_err());
    }
}
