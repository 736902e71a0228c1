use crate::errors::{AppError, AppResult};
use chrono::{Datelike, NaiveDate};

/// Number of days in `month` of `year` (28..=31).
pub fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(ny, nm, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

pub fn parse_date(s: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| AppError::InvalidDate(s.to_string()))
}

pub fn parse_optional_date(s: Option<&str>) -> AppResult<Option<NaiveDate>> {
    s.map(parse_date).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_day_handles_leap_years_and_december() {
        assert_eq!(last_day_of_month(2024, 2), 29);
        assert_eq!(last_day_of_month(2023, 2), 28);
        assert_eq!(last_day_of_month(2026, 12), 31);
        assert_eq!(last_day_of_month(2026, 4), 30);
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert!(parse_date("2026-01-05").is_ok());
        assert!(matches!(parse_date("05/01/2026"), Err(AppError::InvalidDate(_))));
    }
}
