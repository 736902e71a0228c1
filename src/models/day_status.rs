use serde::{Deserialize, Serialize};

/// Approval lifecycle of a workday record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Draft,
    Pending,
    Approved,
    Denied,
}

impl DayStatus {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            DayStatus::Draft => "draft",
            DayStatus::Pending => "pending",
            DayStatus::Approved => "approved",
            DayStatus::Denied => "denied",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(DayStatus::Draft),
            "pending" => Some(DayStatus::Pending),
            "approved" => Some(DayStatus::Approved),
            "denied" => Some(DayStatus::Denied),
            _ => None,
        }
    }

    /// A decided day must be invalidated before the tutor may touch it again.
    pub fn is_decided(&self) -> bool {
        matches!(self, DayStatus::Approved | DayStatus::Denied)
    }
}

/// Orthogonal to `DayStatus`: is there an open session right now?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClockState {
    ClockedIn,
    ClockedOut,
}

impl ClockState {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ClockState::ClockedIn => "clocked_in",
            ClockState::ClockedOut => "clocked_out",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "clocked_in" => Some(ClockState::ClockedIn),
            "clocked_out" => Some(ClockState::ClockedOut),
            _ => None,
        }
    }
}

impl std::fmt::Display for DayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_db_str())
    }
}
