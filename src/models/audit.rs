use super::day_status::DayStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Saved,
    ClockIn,
    ClockOut,
    Submitted,
    Approved,
    Denied,
    Invalidated,
    AdminFixed,
    AdminEdited,
    AutoApproved,
}

impl AuditAction {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AuditAction::Created => "created",
            AuditAction::Saved => "saved",
            AuditAction::ClockIn => "clock_in",
            AuditAction::ClockOut => "clock_out",
            AuditAction::Submitted => "submitted",
            AuditAction::Approved => "approved",
            AuditAction::Denied => "denied",
            AuditAction::Invalidated => "invalidated",
            AuditAction::AdminFixed => "admin_fixed",
            AuditAction::AdminEdited => "admin_edited",
            AuditAction::AutoApproved => "auto_approved",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "created" => Some(AuditAction::Created),
            "saved" => Some(AuditAction::Saved),
            "clock_in" => Some(AuditAction::ClockIn),
            "clock_out" => Some(AuditAction::ClockOut),
            "submitted" => Some(AuditAction::Submitted),
            "approved" => Some(AuditAction::Approved),
            "denied" => Some(AuditAction::Denied),
            "invalidated" => Some(AuditAction::Invalidated),
            "admin_fixed" => Some(AuditAction::AdminFixed),
            "admin_edited" => Some(AuditAction::AdminEdited),
            "auto_approved" => Some(AuditAction::AutoApproved),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActorType {
    Tutor,
    Admin,
    System,
}

impl ActorType {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ActorType::Tutor => "TUTOR",
            ActorType::Admin => "ADMIN",
            ActorType::System => "SYSTEM",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "TUTOR" => Some(ActorType::Tutor),
            "ADMIN" => Some(ActorType::Admin),
            "SYSTEM" => Some(ActorType::System),
            _ => None,
        }
    }
}

/// One row of the append-only decision ledger.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: i64,
    pub entry_day_id: i64,
    pub action: AuditAction,
    pub actor_account_type: ActorType,
    pub actor_account_id: Option<i64>, // None for SYSTEM
    pub at: DateTime<Utc>,
    pub previous_status: Option<DayStatus>,
    pub new_status: DayStatus,
    pub metadata: serde_json::Value,
}
