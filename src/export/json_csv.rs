// src/export/json_csv.rs

use crate::errors::{AppError, AppResult};
use crate::export::model::PeriodReport;
use crate::export::{DayExport, notify_export_success};
use crate::models::pay_period::PayPeriod;
use crate::ui::messages::info;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Export JSON pretty-printed, with the pay period as a header object.
pub(crate) fn export_json(period: &PayPeriod, rows: &[DayExport], path: &Path) -> AppResult<()> {
    info(format!("Exporting to JSON: {}", path.display()));

    let report = PeriodReport {
        pay_period: period,
        total_worked_minutes: rows.iter().map(|r| r.worked_minutes).sum(),
        days: rows,
    };
    let json_data = serde_json::to_string_pretty(&report)?;

    let mut file = File::create(path)?;
    file.write_all(json_data.as_bytes())?;

    notify_export_success("JSON", path);
    Ok(())
}

/// Export CSV (header included via serde).
pub(crate) fn export_csv(rows: &[DayExport], path: &Path) -> AppResult<()> {
    info(format!("Exporting to CSV: {}", path.display()));

    let mut wtr = csv::Writer::from_path(path)
        .map_err(|e| AppError::Export(format!("CSV open error: {e}")))?;

    for item in rows {
        wtr.serialize(item)
            .map_err(|e| AppError::Export(format!("CSV write error: {e}")))?;
    }

    wtr.flush()?;

    notify_export_success("CSV", path);
    Ok(())
}
