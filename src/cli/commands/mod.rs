pub mod admin;
pub mod attest;
pub mod audit;
pub mod clock;
pub mod config;
pub mod day;
pub mod db;
pub mod export;
pub mod franchise;
pub mod init;
pub mod log;
pub mod period;
pub mod snapshot;

use crate::cli::parser::Cli;
use crate::config::Config;
use crate::core::context::CoreContext;
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::models::actor::Actor;
use crate::models::time_range::TimeRange;
use crate::utils::path::ensure_parent_dir;
use crate::utils::time::parse_instant;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Everything a command handler needs besides its own arguments.
pub struct RunContext {
    pub cfg: Config,
    pub core: CoreContext,
    pub actor: Option<Actor>,
    pub json: bool,
}

impl RunContext {
    pub fn from_cli(cli: &Cli, cfg: Config) -> AppResult<Self> {
        let mut core = CoreContext::from_config(&cfg);
        if let Some(raw) = &cli.now {
            core = core.with_now(parse_instant(raw)?);
        }
        let actor = cli.actor.as_deref().map(Actor::parse).transpose()?;

        Ok(Self {
            cfg,
            core,
            actor,
            json: cli.json,
        })
    }

    /// Open the configured database, applying pending migrations.
    pub fn open_pool(&self) -> AppResult<DbPool> {
        ensure_parent_dir(Path::new(&self.cfg.database))?;
        let pool = DbPool::new(&self.cfg.database)?;
        init_db(&pool.conn)?;
        Ok(pool)
    }

    pub fn actor(&self) -> AppResult<Actor> {
        self.actor.ok_or_else(|| {
            AppError::Authorization("this command needs --actor tutor:<id> or admin:<id>".into())
        })
    }

    /// The acting tutor's account id.
    pub fn tutor_id(&self) -> AppResult<i64> {
        match self.actor()? {
            Actor::Tutor { account_id } => Ok(account_id),
            _ => Err(AppError::Authorization(
                "this command must be run as a tutor (--actor tutor:<id>)".into(),
            )),
        }
    }
}

/// `START/END` as two RFC 3339 instants.
pub(crate) fn parse_session_arg(raw: &str) -> AppResult<TimeRange> {
    let (start, end) = raw.split_once('/').ok_or_else(|| {
        AppError::Validation(format!("session '{raw}' must look like START/END"))
    })?;
    Ok(TimeRange::new(start.trim(), end.trim()))
}

pub(crate) fn parse_session_args(raw: &[String]) -> AppResult<Vec<TimeRange>> {
    raw.iter().map(|r| parse_session_arg(r)).collect()
}

pub(crate) fn read_json_file<T: DeserializeOwned>(path: &str) -> AppResult<T> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_arg_splits_on_slash() {
        let r = parse_session_arg("2026-01-05T09:00:00-05:00/2026-01-05T10:00:00-05:00").unwrap();
        assert_eq!(r.start, "2026-01-05T09:00:00-05:00");
        assert_eq!(r.end, "2026-01-05T10:00:00-05:00");
        assert!(parse_session_arg("2026-01-05T09:00:00Z").is_err());
    }
}
