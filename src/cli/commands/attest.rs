use crate::cli::commands::{RunContext, print_json};
use crate::cli::parser::{AttestAction, Commands};
use crate::core::attestation::{self, GateOutcome};
use crate::core::pay_period::load_settings;
use crate::db::attestations::list_for_tutor;
use crate::errors::AppResult;
use crate::models::attestation::NewAttestation;
use crate::ui::messages::{info, success, warning};
use crate::utils::date::parse_date;
use crate::utils::table::Table;
use serde_json::json;

pub fn handle(cmd: &Commands, run: &RunContext) -> AppResult<()> {
    let Commands::Attest { action } = cmd else {
        return Ok(());
    };
    let pool = run.open_pool()?;

    match action {
        AttestAction::Record {
            franchise,
            week_end,
            name,
            text,
            text_version,
        } => {
            let actor = run.actor()?;
            let tutor_id = run.tutor_id()?;
            let att = attestation::record(
                &pool.conn,
                &run.core,
                &actor,
                NewAttestation {
                    franchise_id: *franchise,
                    tutor_id,
                    week_end: parse_date(week_end)?,
                    typed_name: name.clone(),
                    attestation_text: text.clone(),
                    attestation_version: text_version.clone(),
                    metadata: json!({ "source": "cli" }),
                },
            )?;

            if run.json {
                return print_json(&att);
            }
            success(format!(
                "Week {} → {} attested by {}.",
                att.week_start, att.week_end, att.typed_name
            ));
        }

        AttestAction::Check {
            franchise,
            tutor,
            date,
        } => {
            let work_date = parse_date(date)?;
            let eff = load_settings(&pool.conn, &run.core, *franchise)?;
            let outcome = attestation::check(
                &pool.conn,
                *franchise,
                *tutor,
                &eff.timezone,
                work_date,
                run.core.now(),
            )?;

            if run.json {
                let body = match outcome {
                    GateOutcome::Allowed => json!({ "ok": true }),
                    GateOutcome::Blocked { missing_week_end } => {
                        json!({ "ok": false, "weekEnd": missing_week_end })
                    }
                };
                return print_json(&body);
            }

            match outcome {
                GateOutcome::Allowed => success(format!("Time entry on {work_date} is allowed.")),
                GateOutcome::Blocked { missing_week_end } => warning(format!(
                    "Blocked: attest the week ending {missing_week_end} first."
                )),
            }
        }

        AttestAction::List { franchise, tutor } => {
            let rows = list_for_tutor(&pool.conn, *franchise, *tutor)?;
            if run.json {
                return print_json(&rows);
            }
            if rows.is_empty() {
                info("No attestations recorded.");
                return Ok(());
            }

            let mut table = Table::new(["Week", "Signed", "Name", "Version"]);
            for a in rows {
                table.add_row(vec![
                    format!("{} → {}", a.week_start, a.week_end),
                    a.signed_at.format("%F %H:%M").to_string(),
                    a.typed_name,
                    a.attestation_version,
                ]);
            }
            print!("{}", table.render());
        }
    }

    Ok(())
}
