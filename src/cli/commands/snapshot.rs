use crate::cli::commands::{RunContext, read_json_file};
use crate::cli::parser::{Commands, SnapshotAction};
use crate::core::pay_period::load_settings;
use crate::core::snapshot::{self, SnapshotScope};
use crate::errors::{AppError, AppResult};
use crate::models::snapshot::{ScheduleEntry, ScheduleSnapshotV1};
use crate::ui::messages::{success, warning};
use crate::utils::date::parse_date;
use std::fs;

fn require_secret(run: &RunContext) -> AppResult<&[u8]> {
    run.core.secret().ok_or_else(|| {
        AppError::Config(
            "no signing secret configured (set signing_secret or TUTORCLOCK_SIGNING_SECRET)".into(),
        )
    })
}

/// Pretty JSON to `out`, or stdout.
fn emit(snap: &ScheduleSnapshotV1, out: Option<&str>) -> AppResult<()> {
    let body = serde_json::to_string_pretty(snap)?;
    match out {
        Some(path) => {
            fs::write(path, body + "\n")?;
            success(format!("Snapshot written to {path}"));
        }
        None => println!("{body}"),
    }
    Ok(())
}

pub fn handle(cmd: &Commands, run: &RunContext) -> AppResult<()> {
    let Commands::Snapshot { action } = cmd else {
        return Ok(());
    };

    match action {
        SnapshotAction::Derive {
            franchise,
            tutor,
            date,
            entries,
            timezone,
            slot_minutes,
            sign,
            out,
        } => {
            let entries: Vec<ScheduleEntry> = read_json_file(entries)?;

            let timezone = match timezone {
                Some(tz) => tz.clone(),
                None => {
                    let pool = run.open_pool()?;
                    load_settings(&pool.conn, &run.core, *franchise)?
                        .timezone
                        .name()
                        .to_string()
                }
            };

            let scope = SnapshotScope {
                franchise_id: *franchise,
                tutor_id: *tutor,
                work_date: parse_date(date)?,
                timezone,
            };
            let slot = slot_minutes.unwrap_or(run.core.default_slot_minutes);
            let mut snap = snapshot::derive(&scope, Some(slot), entries, run.core.now())?;

            if snap.intervals.len() < snap.entries.len() {
                warning(format!(
                    "{} of {} slots could not be read and were skipped",
                    snap.entries.len() - snap.intervals.len(),
                    snap.entries.len()
                ));
            }
            if *sign {
                snap = snapshot::sign(&snap, require_secret(run)?)?;
            }
            emit(&snap, out.as_deref())?;
        }

        SnapshotAction::Sign { file, out } => {
            let snap: ScheduleSnapshotV1 = read_json_file(file)?;
            let signed = snapshot::sign(&snap, require_secret(run)?)?;
            emit(&signed, out.as_deref())?;
        }

        SnapshotAction::Verify { file } => {
            let snap: ScheduleSnapshotV1 = read_json_file(file)?;
            snapshot::verify(&snap, run.core.secret())?;
            if run.core.secret().is_none() {
                warning("No signing secret configured; signatures are not checked.");
            } else if !snap.is_signed() {
                warning("Snapshot is unsigned.");
            }
            success(format!(
                "Snapshot for tutor {} on {} is valid.",
                snap.tutor_id, snap.work_date
            ));
        }
    }

    Ok(())
}
