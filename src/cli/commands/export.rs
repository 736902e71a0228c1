use crate::cli::commands::RunContext;
use crate::cli::parser::Commands;
use crate::errors::AppResult;
use crate::export::ExportLogic;
use crate::utils::date::parse_optional_date;

pub fn handle(cmd: &Commands, run: &RunContext) -> AppResult<()> {
    if let Commands::Export {
        franchise,
        date,
        format,
        file,
        force,
    } = cmd
    {
        let actor = run.actor()?;
        let for_date = parse_optional_date(date.as_deref())?;
        let mut pool = run.open_pool()?;
        ExportLogic::export(
            &mut pool, &run.core, &actor, *franchise, for_date, *format, file, *force,
        )?;
    }
    Ok(())
}
