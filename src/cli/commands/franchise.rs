use crate::cli::commands::{RunContext, print_json};
use crate::cli::parser::{Commands, FranchiseAction};
use crate::core::pay_period::{effective_settings, update_settings};
use crate::db::log::ttlog;
use crate::db::settings::load_franchise_settings;
use crate::errors::AppResult;
use crate::models::pay_period::FranchiseSettings;
use crate::ui::messages::{field, header, success, warning};
use crate::utils::date::parse_optional_date;
use serde_json::json;

pub fn handle(cmd: &Commands, run: &RunContext) -> AppResult<()> {
    let Commands::Franchise { action } = cmd else {
        return Ok(());
    };
    let pool = run.open_pool()?;

    match action {
        FranchiseAction::Set {
            franchise,
            timezone,
            period_type,
            anchor,
        } => {
            let actor = run.actor()?;
            let anchor = parse_optional_date(anchor.as_deref())?;

            // unspecified fields keep their stored value
            let current = load_franchise_settings(&pool.conn, *franchise)?.unwrap_or_default();
            let next = FranchiseSettings {
                franchise_id: *franchise,
                timezone: timezone.clone().or(current.timezone),
                period_type: period_type.clone().or(current.period_type),
                biweekly_anchor: anchor.or(current.biweekly_anchor),
            };

            let warnings = update_settings(&pool.conn, &run.core, &actor, &next)?;
            for w in &warnings {
                warning(w);
            }
            ttlog(
                &pool.conn,
                "franchise",
                &franchise.to_string(),
                "settings updated",
            )?;
            success(format!("Settings saved for franchise {franchise}."));
        }

        FranchiseAction::Show { franchise } => {
            let stored = load_franchise_settings(&pool.conn, *franchise)?;
            let eff = effective_settings(stored.as_ref(), &run.core);

            if run.json {
                return print_json(&json!({
                    "stored": stored,
                    "effective": {
                        "timezone": eff.timezone.name(),
                        "periodType": eff.period_type,
                        "biweeklyAnchor": eff.biweekly_anchor,
                    }
                }));
            }

            header(format!("Franchise {franchise}"));
            if stored.is_none() {
                warning("No settings stored; defaults apply.");
            }
            field("Timezone", eff.timezone.name());
            field("Period type", eff.period_type.to_db_str());
            field("Biweekly anchor", eff.biweekly_anchor);
        }
    }

    Ok(())
}
