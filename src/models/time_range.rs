use serde::{Deserialize, Serialize};

/// A `[start, end)` range as it travels on the wire: two RFC 3339 timestamps
/// with explicit offsets. Parsing into minute intervals happens in
/// `core::interval`, never here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

impl TimeRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}
