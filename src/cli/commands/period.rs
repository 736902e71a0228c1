use crate::cli::commands::{RunContext, print_json};
use crate::cli::parser::{Commands, PeriodAction};
use crate::core::pay_period::{create_override, resolve_pay_period};
use crate::db::log::ttlog;
use crate::db::settings::list_overrides;
use crate::errors::AppResult;
use crate::ui::messages::{field, header, info, success};
use crate::utils::date::{parse_date, parse_optional_date};
use crate::utils::table::Table;

pub fn handle(cmd: &Commands, run: &RunContext) -> AppResult<()> {
    let Commands::Period { action } = cmd else {
        return Ok(());
    };
    let pool = run.open_pool()?;

    match action {
        PeriodAction::Resolve { franchise, date } => {
            let for_date = parse_optional_date(date.as_deref())?;
            let period = resolve_pay_period(&pool.conn, &run.core, *franchise, for_date)?;

            if run.json {
                return print_json(&period);
            }

            header(format!("Pay period for franchise {franchise}"));
            field("For date", period.resolved_for_date);
            field("Window", format!("{} → {}", period.start_date, period.end_date));
            field(
                "UTC bounds",
                format!("[{}, {})", period.start_at.to_rfc3339(), period.end_at.to_rfc3339()),
            );
            field("Timezone", &period.timezone);
            field("Period type", period.period_type.to_db_str());
            match period.override_id {
                Some(id) => field("Source", format!("override #{id}")),
                None => field("Source", "computed"),
            }
        }

        PeriodAction::Override {
            franchise,
            start,
            end,
            reason,
        } => {
            let actor = run.actor()?;
            let ov = create_override(
                &pool.conn,
                &run.core,
                &actor,
                *franchise,
                parse_date(start)?,
                parse_date(end)?,
                reason.as_deref(),
            )?;
            ttlog(
                &pool.conn,
                "override",
                &franchise.to_string(),
                &format!("{} → {}", ov.start_date, ov.end_date),
            )?;

            if run.json {
                return print_json(&ov);
            }
            success(format!(
                "Override #{} added: {} → {}",
                ov.id, ov.start_date, ov.end_date
            ));
        }

        PeriodAction::ListOverrides { franchise } => {
            let rows = list_overrides(&pool.conn, *franchise)?;
            if run.json {
                return print_json(&rows);
            }
            if rows.is_empty() {
                info(format!("No overrides for franchise {franchise}."));
                return Ok(());
            }

            let mut table = Table::new(["ID", "Start", "End", "Created", "Reason"]);
            for ov in rows {
                table.add_row(vec![
                    ov.id.to_string(),
                    ov.start_date.to_string(),
                    ov.end_date.to_string(),
                    ov.created_at.format("%F %H:%M").to_string(),
                    ov.reason.unwrap_or_default(),
                ]);
            }
            print!("{}", table.render());
        }
    }

    Ok(())
}
