use crate::cli::commands::{RunContext, parse_session_args, print_json, read_json_file};
use crate::cli::parser::{Commands, DayAction};
use crate::core::day;
use crate::core::pay_period::{load_settings, local_date};
use crate::errors::{AppError, AppResult};
use crate::models::actor::Actor;
use crate::models::day::DayView;
use crate::models::snapshot::ScheduleSnapshotV1;
use crate::ui::messages::{field, header, info, success};
use crate::utils::colors::{colorize_match, colorize_optional, colorize_status};
use crate::utils::date::parse_date;
use crate::utils::mins2readable;
use crate::utils::table::Table;
use crate::utils::time::local_hhmm;

/// Print a day with its sessions, or the whole view as JSON.
pub(crate) fn print_day(view: &DayView, json: bool) -> AppResult<()> {
    if json {
        return print_json(view);
    }

    let d = &view.day;
    header(format!("Day #{} · tutor {} · {}", d.id, d.tutor_id, d.work_date));
    field("Status", colorize_status(d.status));
    match view.open_session() {
        Some(open) => field(
            "Clock",
            format!("clocked in since {}", local_hhmm(&open.start_at, &d.timezone)),
        ),
        None => field("Clock", d.clock_state.to_db_str()),
    }
    if let Some(reason) = &d.decision_reason {
        field("Reason", reason);
    }

    if view.sessions.is_empty() {
        info("No sessions.");
    } else {
        let mut table = Table::new(["#", "Start", "End", "Worked"]);
        for s in &view.sessions {
            let end = s
                .end_at
                .map(|e| local_hhmm(&e, &d.timezone))
                .unwrap_or_else(|| "--:--".into());
            table.add_row(vec![
                s.id.to_string(),
                local_hhmm(&s.start_at, &d.timezone),
                colorize_optional(&end),
                mins2readable(s.minutes(), false, true),
            ]);
        }
        print!("{}", table.render());
        field("Total", mins2readable(view.worked_minutes(), false, false));
    }

    match &d.comparison {
        Some(c) => {
            field("Schedule", colorize_match(c.matches));
            field(
                "Worked / sched.",
                format!(
                    "{} / {}",
                    mins2readable(c.manual.total_minutes, false, true),
                    mins2readable(c.scheduled.total_minutes, false, true)
                ),
            );
        }
        None => field("Schedule", colorize_optional("")),
    }

    Ok(())
}

pub fn handle(cmd: &Commands, run: &RunContext) -> AppResult<()> {
    let Commands::Day { action } = cmd else {
        return Ok(());
    };
    let actor = run.actor()?;
    let mut pool = run.open_pool()?;

    match action {
        DayAction::Show {
            franchise,
            date,
            tutor,
            id,
        } => {
            if let Some(day_id) = id {
                let view = day::view_by_id(&pool.conn, &actor, *franchise, *day_id)?;
                return print_day(&view, run.json);
            }

            let tutor_id = match (actor, tutor) {
                (_, Some(t)) => *t,
                (Actor::Tutor { account_id }, None) => account_id,
                _ => {
                    return Err(AppError::Validation(
                        "admins must pass --tutor or --id".into(),
                    ));
                }
            };
            let work_date = match date {
                Some(raw) => parse_date(raw)?,
                None => {
                    let eff = load_settings(&pool.conn, &run.core, *franchise)?;
                    local_date(&eff.timezone, run.core.now())
                }
            };

            match day::view(&pool.conn, &actor, *franchise, tutor_id, work_date)? {
                Some(view) => print_day(&view, run.json)?,
                None if run.json => print_json(&serde_json::Value::Null)?,
                None => info(format!("No time entries on {work_date}.")),
            }
        }

        DayAction::Save {
            franchise,
            date,
            sessions,
        } => {
            let tutor_id = run.tutor_id()?;
            let ranges = parse_session_args(sessions)?;
            let view = day::save(
                &mut pool,
                &run.core,
                &actor,
                *franchise,
                tutor_id,
                parse_date(date)?,
                &ranges,
            )?;
            if !run.json {
                success(format!("Saved {} session(s).", view.sessions.len()));
            }
            print_day(&view, run.json)?;
        }

        DayAction::Submit {
            franchise,
            date,
            snapshot,
        } => {
            let tutor_id = run.tutor_id()?;
            let snap: ScheduleSnapshotV1 = read_json_file(snapshot)?;
            let view = day::submit(
                &mut pool,
                &run.core,
                &actor,
                *franchise,
                tutor_id,
                parse_date(date)?,
                snap,
            )?;
            if !run.json {
                success(format!("Submitted; day is now {}.", view.day.status));
            }
            print_day(&view, run.json)?;
        }
    }

    Ok(())
}
