use crate::cli::commands::day::print_day;
use crate::cli::commands::{RunContext, parse_session_arg, parse_session_args};
use crate::cli::parser::{AdminAction, Commands};
use crate::core::admin::{self, Decision};
use crate::db::log::ttlog;
use crate::errors::AppResult;
use crate::ui::messages::success;

pub fn handle(cmd: &Commands, run: &RunContext) -> AppResult<()> {
    let Commands::Admin { action } = cmd else {
        return Ok(());
    };
    let actor = run.actor()?;
    let mut pool = run.open_pool()?;

    let (view, op) = match action {
        AdminAction::Decide {
            franchise,
            day_id,
            decision,
            reason,
        } => {
            let decision = Decision::parse(decision)?;
            let view = admin::decide(
                &mut pool,
                &run.core,
                &actor,
                *day_id,
                *franchise,
                decision,
                reason.as_deref(),
            )?;
            (view, "decide")
        }

        AdminAction::Fix {
            franchise,
            day_id,
            sessions,
            reason,
        } => {
            let ranges = parse_session_args(sessions)?;
            let view = admin::fix(
                &mut pool,
                &run.core,
                &actor,
                *day_id,
                *franchise,
                &ranges,
                reason.as_deref(),
            )?;
            (view, "admin_fix")
        }

        AdminAction::EditSession {
            franchise,
            day_id,
            session_id,
            range,
            reason,
        } => {
            let range = parse_session_arg(range)?;
            let view = admin::edit_session(
                &mut pool,
                &run.core,
                &actor,
                *day_id,
                *franchise,
                *session_id,
                &range,
                reason.as_deref(),
            )?;
            (view, "admin_edit")
        }
    };

    ttlog(
        &pool.conn,
        op,
        &view.day.id.to_string(),
        view.day.status.to_db_str(),
    )?;
    if !run.json {
        success(format!("Day #{} is now {}.", view.day.id, view.day.status));
    }
    print_day(&view, run.json)
}
