use crate::cli::commands::{RunContext, print_json};
use crate::cli::parser::Commands;
use crate::core::audit::{self, AuditLogic};
use crate::errors::AppResult;
use crate::ui::messages::{header, info};
use serde_json::json;

pub fn handle(cmd: &Commands, run: &RunContext) -> AppResult<()> {
    if let Commands::Audit { franchise, day_id } = cmd {
        let actor = run.actor()?;
        let pool = run.open_pool()?;
        let (day, entries) = audit::trail(&pool.conn, &actor, *franchise, *day_id)?;

        if run.json {
            return print_json(&json!({ "day": day, "entries": entries }));
        }

        header(format!(
            "Audit trail · day #{} · tutor {} · {}",
            day.id, day.tutor_id, day.work_date
        ));
        if entries.is_empty() {
            info("No audit entries.");
        } else {
            print!("{}", AuditLogic::render(&entries));
        }
    }
    Ok(())
}
