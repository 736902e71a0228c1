//! tutorclock library root.
//! Exposes the CLI parser, the high-level `run()` entry point and the
//! internal modules (core logic, storage, export).

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod export;
pub mod logging;
pub mod models;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::commands::{self, RunContext};
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;
use utils::path::expand_tilde;

/// Central command dispatcher
pub fn dispatch(cli: &Cli, run: &RunContext) -> AppResult<()> {
    let cmd = &cli.command;
    match cmd {
        Commands::Init => commands::init::handle(cli),
        Commands::Config { .. } => commands::config::handle(cmd, &run.cfg),
        Commands::Db { .. } => commands::db::handle(cmd, run),
        Commands::Log { .. } => commands::log::handle(cmd, run),
        Commands::Franchise { .. } => commands::franchise::handle(cmd, run),
        Commands::Period { .. } => commands::period::handle(cmd, run),
        Commands::Attest { .. } => commands::attest::handle(cmd, run),
        Commands::Snapshot { .. } => commands::snapshot::handle(cmd, run),
        Commands::Clock { .. } => commands::clock::handle(cmd, run),
        Commands::Day { .. } => commands::day::handle(cmd, run),
        Commands::Admin { .. } => commands::admin::handle(cmd, run),
        Commands::Audit { .. } => commands::audit::handle(cmd, run),
        Commands::Export { .. } => commands::export::handle(cmd, run),
    }
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    let cli = Cli::parse();

    // config is loaded once; --db wins over the configured path
    let mut cfg = Config::load()?;
    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }
    cfg.database = expand_tilde(&cfg.database).to_string_lossy().to_string();

    logging::init(&cfg.log_level);

    let run = RunContext::from_cli(&cli, cfg)?;
    dispatch(&cli, &run)
}
