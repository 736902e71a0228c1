//! SQLite connection wrapper (one connection per request/command).

use crate::errors::AppResult;
use rusqlite::{Connection, Result, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Duration;

/// How long a writer waits for another writer's transaction to finish
/// before giving up with a retryable conflict.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct DbPool {
    pub conn: Connection,
}

fn configure(conn: &Connection) -> Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        "#,
    )?;
    Ok(())
}

impl DbPool {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(Path::new(path))?;
        configure(&conn)?;
        Ok(Self { conn })
    }

    /// Run `func` inside `BEGIN IMMEDIATE`.
    ///
    /// The write lock is taken at BEGIN, so two clock actions for the same
    /// tutor/day never interleave their read-modify-write. Any error rolls
    /// the whole transaction back (the Transaction is dropped uncommitted).
    pub fn with_immediate_tx<F, T>(&mut self, func: F) -> AppResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> AppResult<T>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = func(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}
