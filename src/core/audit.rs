//! Audit trail: one append-only entry per day transition.

use crate::db::{audit as audit_db, days};
use crate::errors::{AppError, AppResult};
use crate::models::actor::Actor;
use crate::models::audit::{AuditAction, AuditLogEntry};
use crate::models::day::TimeEntryDay;
use crate::models::day_status::DayStatus;
use crate::utils::table::Table;
use ansi_term::Colour;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde_json::Value;
use tracing::debug;

/// A transition about to be written.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub action: AuditAction,
    pub actor: Actor,
    pub previous_status: Option<DayStatus>,
    pub new_status: DayStatus,
    pub metadata: Value,
}

impl AuditEvent {
    pub fn new(action: AuditAction, actor: Actor, previous: Option<DayStatus>, new: DayStatus) -> Self {
        Self {
            action,
            actor,
            previous_status: previous,
            new_status: new,
            metadata: Value::Object(Default::default()),
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Append one entry. Must run inside the transaction that made the change.
pub fn record(
    conn: &Connection,
    day_id: i64,
    at: DateTime<Utc>,
    event: AuditEvent,
) -> AppResult<i64> {
    let entry = AuditLogEntry {
        id: 0,
        entry_day_id: day_id,
        action: event.action,
        actor_account_type: event.actor.account_type(),
        actor_account_id: event.actor.account_id(),
        at,
        previous_status: event.previous_status,
        new_status: event.new_status,
        metadata: event.metadata,
    };
    let id = audit_db::insert(conn, &entry)?;
    debug!(day_id, action = entry.action.to_db_str(), "audit entry written");
    Ok(id)
}

/// Tutors read their own days; admins read days of their franchise.
pub fn ensure_can_read(actor: &Actor, day: &TimeEntryDay, franchise_id: i64) -> AppResult<()> {
    if day.franchise_id != franchise_id {
        return Err(AppError::Authorization(
            "day belongs to another franchise".into(),
        ));
    }
    match actor {
        Actor::Tutor { .. } => actor.ensure_tutor(day.tutor_id),
        Actor::Admin { .. } | Actor::System => Ok(()),
    }
}

/// Day plus its full audit trail, oldest first.
pub fn trail(
    conn: &Connection,
    actor: &Actor,
    franchise_id: i64,
    day_id: i64,
) -> AppResult<(TimeEntryDay, Vec<AuditLogEntry>)> {
    let day = days::find_day_by_id(conn, day_id)?
        .ok_or_else(|| AppError::NotFound(format!("time entry day {day_id}")))?;
    ensure_can_read(actor, &day, franchise_id)?;
    let entries = audit_db::list_for_day(conn, day_id)?;
    Ok((day, entries))
}

fn color_for_action(action: AuditAction) -> Colour {
    match action {
        AuditAction::Created | AuditAction::Saved => Colour::White,
        AuditAction::ClockIn | AuditAction::ClockOut => Colour::Cyan,
        AuditAction::Submitted => Colour::Yellow,
        AuditAction::Approved | AuditAction::AutoApproved => Colour::Green,
        AuditAction::Denied => Colour::Red,
        AuditAction::Invalidated => Colour::Purple,
        AuditAction::AdminFixed | AuditAction::AdminEdited => Colour::RGB(255, 153, 51),
    }
}

pub struct AuditLogic;

impl AuditLogic {
    pub fn render(entries: &[AuditLogEntry]) -> String {
        let mut table = Table::new(["ID", "At", "Action", "Actor", "Status", "Details"]);

        for e in entries {
            let actor = match e.actor_account_id {
                Some(id) => format!("{}:{}", e.actor_account_type.to_db_str(), id),
                None => e.actor_account_type.to_db_str().to_string(),
            };
            let status = match e.previous_status {
                Some(prev) if prev != e.new_status => format!("{prev} → {}", e.new_status),
                _ => e.new_status.to_string(),
            };
            let mut details = e.metadata.to_string();
            if details.chars().count() > 60 {
                details = details.chars().take(57).collect::<String>() + "...";
            }

            table.add_row(vec![
                e.id.to_string(),
                e.at.format("%FT%H:%MZ").to_string(),
                color_for_action(e.action).paint(e.action.to_db_str()).to_string(),
                actor,
                status,
                details,
            ]);
        }

        table.render()
    }
}
