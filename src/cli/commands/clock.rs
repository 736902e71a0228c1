use crate::cli::commands::day::print_day;
use crate::cli::commands::{RunContext, print_json, read_json_file};
use crate::cli::parser::{ClockAction, Commands};
use crate::core::day;
use crate::db::log::ttlog;
use crate::errors::AppResult;
use crate::models::snapshot::ScheduleSnapshotV1;
use crate::ui::messages::{info, success, warning};
use crate::utils::time::local_hhmm;

pub fn handle(cmd: &Commands, run: &RunContext) -> AppResult<()> {
    let Commands::Clock { action } = cmd else {
        return Ok(());
    };
    let actor = run.actor()?;
    let tutor_id = run.tutor_id()?;
    let mut pool = run.open_pool()?;

    match action {
        ClockAction::In { franchise } => {
            let outcome = day::clock_in(&mut pool, &run.core, &actor, *franchise, tutor_id)?;

            if !run.json {
                let tz = outcome.view.day.timezone.clone();
                let started = outcome
                    .view
                    .sessions
                    .iter()
                    .find(|s| s.id == outcome.session_id)
                    .map(|s| local_hhmm(&s.start_at, &tz))
                    .unwrap_or_default();

                if outcome.opened {
                    ttlog(&pool.conn, "clock_in", &tutor_id.to_string(), &started)?;
                    success(format!("Clocked in at {started}."));
                } else {
                    info(format!("Already clocked in since {started}."));
                }
            }
            print_day(&outcome.view, run.json)?;
        }

        ClockAction::Out {
            franchise,
            finalize,
            snapshot,
        } => {
            let snap: Option<ScheduleSnapshotV1> =
                snapshot.as_deref().map(read_json_file::<ScheduleSnapshotV1>).transpose()?;
            let outcome = day::clock_out(
                &mut pool, &run.core, &actor, *franchise, tutor_id, *finalize, snap,
            )?;

            if !run.json {
                if !outcome.changed() {
                    info("Not clocked in; nothing to do.");
                } else if outcome.discarded {
                    warning("Session shorter than a minute was discarded.");
                } else if outcome.closed_session_id.is_some() {
                    success("Clocked out.");
                }
                if outcome.finalized
                    && let Some(view) = &outcome.view
                {
                    success(format!("Day is now {}.", view.day.status));
                }
            }
            if outcome.closed_session_id.is_some() {
                ttlog(&pool.conn, "clock_out", &tutor_id.to_string(), "")?;
            }
            match &outcome.view {
                Some(view) => print_day(view, run.json)?,
                None if run.json => print_json(&serde_json::Value::Null)?,
                None => {}
            }
        }
    }

    Ok(())
}
