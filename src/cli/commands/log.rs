use crate::cli::commands::RunContext;
use crate::cli::parser::Commands;
use crate::core::log::LogLogic;
use crate::errors::AppResult;

pub fn handle(cmd: &Commands, run: &RunContext) -> AppResult<()> {
    if matches!(cmd, Commands::Log { print: true }) {
        let mut pool = run.open_pool()?;
        LogLogic::print_log(&mut pool)?;
    }

    Ok(())
}
