use crate::errors::{AppError, AppResult};
use rusqlite::{Connection, OptionalExtension, Result};
use tracing::{debug, info};

/// Ensure that the `log` table exists. Migration bookkeeping lives there.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

struct Migration {
    id: &'static str,
    message: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        id: "20250301_0001_create_franchise_settings",
        message: "Created franchise_settings and pay_period_overrides",
        sql: r#"
        CREATE TABLE IF NOT EXISTS franchise_settings (
            franchise_id     INTEGER PRIMARY KEY,
            timezone         TEXT,
            period_type      TEXT,
            biweekly_anchor  TEXT,
            updated_at       TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS pay_period_overrides (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            franchise_id  INTEGER NOT NULL,
            start_date    TEXT NOT NULL,
            end_date      TEXT NOT NULL,
            reason        TEXT,
            created_at    TEXT NOT NULL,
            CHECK (start_date <= end_date)
        );

        CREATE INDEX IF NOT EXISTS idx_overrides_franchise_dates
            ON pay_period_overrides(franchise_id, start_date, end_date);
        "#,
    },
    Migration {
        id: "20250301_0002_create_weekly_attestations",
        message: "Created weekly_attestations",
        sql: r#"
        CREATE TABLE IF NOT EXISTS weekly_attestations (
            id                   INTEGER PRIMARY KEY AUTOINCREMENT,
            franchise_id         INTEGER NOT NULL,
            tutor_id             INTEGER NOT NULL,
            week_start           TEXT NOT NULL,
            week_end             TEXT NOT NULL,
            timezone             TEXT NOT NULL,
            typed_name           TEXT NOT NULL,
            signed_at            TEXT NOT NULL,
            attestation_text     TEXT NOT NULL,
            attestation_version  TEXT NOT NULL,
            metadata             TEXT NOT NULL DEFAULT '{}',
            UNIQUE (franchise_id, tutor_id, week_end)
        );
        "#,
    },
    Migration {
        id: "20250301_0003_create_time_entry_days",
        message: "Created time_entry_days and time_entry_sessions",
        sql: r#"
        CREATE TABLE IF NOT EXISTS time_entry_days (
            id                 INTEGER PRIMARY KEY AUTOINCREMENT,
            franchise_id       INTEGER NOT NULL,
            tutor_id           INTEGER NOT NULL,
            work_date          TEXT NOT NULL,
            timezone           TEXT NOT NULL,
            status             TEXT NOT NULL DEFAULT 'draft'
                               CHECK (status IN ('draft','pending','approved','denied')),
            clock_state        TEXT NOT NULL DEFAULT 'clocked_out'
                               CHECK (clock_state IN ('clocked_in','clocked_out')),
            schedule_snapshot  TEXT,
            comparison         TEXT,
            submitted_at       TEXT,
            decided_by_type    TEXT,
            decided_by         INTEGER,
            decided_at         TEXT,
            decision_reason    TEXT,
            created_at         TEXT NOT NULL,
            updated_at         TEXT NOT NULL,
            UNIQUE (franchise_id, tutor_id, work_date)
        );

        CREATE INDEX IF NOT EXISTS idx_days_franchise_date
            ON time_entry_days(franchise_id, work_date);

        CREATE TABLE IF NOT EXISTS time_entry_sessions (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            entry_day_id  INTEGER NOT NULL REFERENCES time_entry_days(id) ON DELETE CASCADE,
            start_at      TEXT NOT NULL,
            end_at        TEXT,
            sort_order    INTEGER NOT NULL DEFAULT 0,
            CHECK (end_at IS NULL OR end_at > start_at)
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_day
            ON time_entry_sessions(entry_day_id, sort_order);

        -- at most one open session per day
        CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_one_open
            ON time_entry_sessions(entry_day_id) WHERE end_at IS NULL;
        "#,
    },
    Migration {
        id: "20250301_0004_create_time_entry_audit_log",
        message: "Created time_entry_audit_log",
        sql: r#"
        CREATE TABLE IF NOT EXISTS time_entry_audit_log (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            entry_day_id        INTEGER NOT NULL REFERENCES time_entry_days(id),
            action              TEXT NOT NULL,
            actor_account_type  TEXT NOT NULL CHECK (actor_account_type IN ('TUTOR','ADMIN','SYSTEM')),
            actor_account_id    INTEGER,
            at                  TEXT NOT NULL,
            previous_status     TEXT,
            new_status          TEXT NOT NULL,
            metadata            TEXT NOT NULL DEFAULT '{}'
        );

        CREATE INDEX IF NOT EXISTS idx_audit_day
            ON time_entry_audit_log(entry_day_id, id);
        "#,
    },
];

fn is_applied(conn: &Connection, id: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([id], |_| Ok(())).optional()?.is_some())
}

fn apply(conn: &Connection, m: &Migration) -> AppResult<()> {
    conn.execute_batch(m.sql)
        .map_err(|e| AppError::Migration(format!("{}: {}", m.id, e)))?;

    conn.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        [m.id, m.message],
    )?;

    info!(migration = m.id, "migration applied");
    Ok(())
}

/// Ids of migrations that have not yet been recorded in `log`.
pub fn pending_migrations(conn: &Connection) -> AppResult<Vec<&'static str>> {
    ensure_log_table(conn)?;
    let mut out = Vec::new();
    for m in MIGRATIONS {
        if !is_applied(conn, m.id)? {
            out.push(m.id);
        }
    }
    Ok(out)
}

/// Public entry point: run all pending migrations, oldest first.
/// Returns how many were applied.
pub fn run_pending_migrations(conn: &Connection) -> AppResult<usize> {
    ensure_log_table(conn)?;

    let mut applied = 0;
    for m in MIGRATIONS {
        if is_applied(conn, m.id)? {
            debug!(migration = m.id, "already applied");
            continue;
        }
        apply(conn, m)?;
        applied += 1;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_apply_once() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(run_pending_migrations(&conn).unwrap(), MIGRATIONS.len());
        assert_eq!(run_pending_migrations(&conn).unwrap(), 0);
        assert!(pending_migrations(&conn).unwrap().is_empty());
    }

    #[test]
    fn only_one_open_session_per_day() {
        let conn = Connection::open_in_memory().unwrap();
        run_pending_migrations(&conn).unwrap();
        conn.execute(
            "INSERT INTO time_entry_days (franchise_id, tutor_id, work_date, timezone, created_at, updated_at)
             VALUES (1, 7, '2026-01-05', 'UTC', 'x', 'x')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO time_entry_sessions (entry_day_id, start_at) VALUES (1, '2026-01-05T14:00:00Z')",
            [],
        )
        .unwrap();
        let second = conn.execute(
            "INSERT INTO time_entry_sessions (entry_day_id, start_at) VALUES (1, '2026-01-05T15:00:00Z')",
            [],
        );
        assert!(second.is_err());
    }
}
