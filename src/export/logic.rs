// src/export/logic.rs

use crate::core::context::CoreContext;
use crate::core::day::load_view;
use crate::core::pay_period::resolve_pay_period;
use crate::db::days;
use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::export::ExportFormat;
use crate::export::fs_utils::ensure_writable;
use crate::export::json_csv::{export_csv, export_json};
use crate::export::model::DayExport;
use crate::models::actor::Actor;
use crate::models::pay_period::PayPeriod;
use crate::ui::messages::warning;
use chrono::NaiveDate;
use std::path::Path;
use tracing::info;

pub struct ExportLogic;

impl ExportLogic {
    /// Every day of the pay period containing `for_date`, one row per day.
    pub fn collect(
        pool: &mut DbPool,
        ctx: &CoreContext,
        franchise_id: i64,
        for_date: Option<NaiveDate>,
    ) -> AppResult<(PayPeriod, Vec<DayExport>)> {
        let conn = &pool.conn;
        let period = resolve_pay_period(conn, ctx, franchise_id, for_date)?;

        let mut rows = Vec::new();
        for day in days::list_days_in_range(conn, franchise_id, period.start_date, period.end_date)? {
            let view = load_view(conn, day)?;
            rows.push(DayExport::from(&view));
        }
        Ok((period, rows))
    }

    /// Write the pay-period report. Admin only.
    #[allow(clippy::too_many_arguments)]
    pub fn export(
        pool: &mut DbPool,
        ctx: &CoreContext,
        actor: &Actor,
        franchise_id: i64,
        for_date: Option<NaiveDate>,
        format: ExportFormat,
        file: &str,
        force: bool,
    ) -> AppResult<()> {
        actor.ensure_admin()?;

        let path = Path::new(file);
        if !path.is_absolute() {
            return Err(AppError::Export(format!(
                "Output file path must be absolute: {file}"
            )));
        }
        ensure_writable(path, force)?;

        let (period, rows) = Self::collect(pool, ctx, franchise_id, for_date)?;
        if rows.is_empty() {
            warning(format!(
                "No time entry days in pay period {} → {}.",
                period.start_date, period.end_date
            ));
        }

        match format {
            ExportFormat::Csv => export_csv(&rows, path)?,
            ExportFormat::Json => export_json(&period, &rows, path)?,
        }

        info!(franchise_id, rows = rows.len(), format = format.as_str(), "pay period exported");
        ttlog(
            &pool.conn,
            "export",
            file,
            &format!(
                "{} rows, period {}..{}",
                rows.len(),
                period.start_date,
                period.end_date
            ),
        )?;
        Ok(())
    }
}
