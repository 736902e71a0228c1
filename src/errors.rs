//! Unified application error type.
//! All modules (db, core, cli, utils) return AppError to keep the error
//! handling consistent. Leaf modules (interval, snapshot, comparison, gate)
//! keep their own typed errors and convert into AppError with `?`.

use crate::core::attestation::GateError;
use crate::core::comparison::ComparisonError;
use crate::core::interval::IntervalError;
use crate::core::snapshot::SnapshotError;
use chrono::NaiveDate;
use rusqlite::ErrorCode;
use std::io;
use thiserror::Error;

/// Coarse classification used by callers (and by the binary's exit code).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authorization,
    Precondition,
    Conflict,
    Fatal,
}

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // Validation (rejected before any row is touched)
    // ---------------------------
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid interval: {0}")]
    Interval(#[from] IntervalError),

    #[error("Invalid time entry data: {0}")]
    Comparison(#[from] ComparisonError),

    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    // ---------------------------
    // Authorization
    // ---------------------------
    #[error("Not allowed: {0}")]
    Authorization(String),

    // ---------------------------
    // Preconditions
    // ---------------------------
    #[error("Weekly attestation required for the week ending {missing_week_end}")]
    AttestationRequired { missing_week_end: NaiveDate },

    #[error("Invalid day state: {0}")]
    InvalidState(String),

    #[error("Schedule snapshot rejected: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Not found: {0}")]
    NotFound(String),

    // ---------------------------
    // Concurrency
    // ---------------------------
    #[error("Concurrent modification, please retry: {0}")]
    Conflict(String),

    // ---------------------------
    // Infrastructure
    // ---------------------------
    #[error("Attestation gate unavailable: {0}")]
    GateUnavailable(#[from] GateError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Database error: {0}")]
    Db(rusqlite::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Internal error: {0}")]
    Other(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_)
            | AppError::Interval(_)
            | AppError::Comparison(_)
            | AppError::InvalidDate(_)
            | AppError::InvalidTime(_) => ErrorKind::Validation,

            AppError::Authorization(_) => ErrorKind::Authorization,

            AppError::Snapshot(
                SnapshotError::InvalidSlotLength(_) | SnapshotError::InvalidTimezone(_),
            ) => ErrorKind::Validation,

            AppError::AttestationRequired { .. }
            | AppError::InvalidState(_)
            | AppError::Snapshot(_)
            | AppError::NotFound(_) => ErrorKind::Precondition,

            AppError::Conflict(_) => ErrorKind::Conflict,

            AppError::GateUnavailable(_)
            | AppError::Io(_)
            | AppError::Db(_)
            | AppError::Json(_)
            | AppError::Migration(_)
            | AppError::Config(_)
            | AppError::Export(_)
            | AppError::Other(_) => ErrorKind::Fatal,
        }
    }

    /// Only a lost race on the day lock is worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// Process exit code used by the binary.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Validation => 2,
            ErrorKind::Authorization => 3,
            ErrorKind::Precondition => 4,
            ErrorKind::Conflict => 75,
            ErrorKind::Fatal => 1,
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ffi, ref msg) = err {
            match ffi.code {
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                    return AppError::Conflict("database is locked by another writer".into());
                }
                ErrorCode::ConstraintViolation
                    if msg.as_deref().is_some_and(|m| m.contains("UNIQUE")) =>
                {
                    return AppError::Conflict(
                        msg.clone().unwrap_or_else(|| "unique constraint".into()),
                    );
                }
                _ => {}
            }
        }
        AppError::Db(err)
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_database_maps_to_retryable_conflict() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        let app: AppError = err.into();
        assert!(app.is_retryable());
        assert_eq!(app.exit_code(), 75);
    }

    #[test]
    fn other_sqlite_failures_stay_fatal() {
        let app: AppError = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(app.kind(), ErrorKind::Fatal);
        assert!(!app.is_retryable());
    }

    #[test]
    fn attestation_required_is_a_precondition() {
        let app = AppError::AttestationRequired {
            missing_week_end: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
        };
        assert_eq!(app.kind(), ErrorKind::Precondition);
        assert!(app.to_string().contains("2026-01-10"));
    }
}
