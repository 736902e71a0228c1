/// ANSI color helper utilities for terminal output.
use crate::models::day_status::DayStatus;

pub const RESET: &str = "\x1b[0m";

pub const GREY: &str = "\x1b[90m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

pub fn color_for_status(status: DayStatus) -> &'static str {
    match status {
        DayStatus::Draft => GREY,
        DayStatus::Pending => YELLOW,
        DayStatus::Approved => GREEN,
        DayStatus::Denied => RED,
    }
}

pub fn colorize_status(status: DayStatus) -> String {
    format!("{}{}{}", color_for_status(status), status, RESET)
}

/// Grey placeholder for empty values.
pub fn colorize_optional(value: &str) -> String {
    if value.trim().is_empty() || value.trim() == "--:--" {
        format!("{GREY}{value}{RESET}")
    } else {
        value.to_string()
    }
}

/// Green when the two sides match, red otherwise.
pub fn colorize_match(matches: bool) -> String {
    if matches {
        format!("{GREEN}match{RESET}")
    } else {
        format!("{RED}mismatch{RESET}")
    }
}
