//! Resolution suggestions for detected conflicts.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use engram_core::memory::MemoryObject;

/// How a conflict should be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Keep the side with the stronger evidence tier.
    KeepGrounded,
    /// Keep the more recently created side.
    KeepNewer,
    /// No safe automatic pick; surface to the user.
    AskUser,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::KeepGrounded => "keep_grounded",
            Resolution::KeepNewer => "keep_newer",
            Resolution::AskUser => "ask_user",
        }
    }

    /// Whether non-interactive mode may apply this resolution on its own.
    pub fn is_automatic(&self) -> bool {
        !matches!(self, Resolution::AskUser)
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Heuristic: differing evidence tiers favor the grounded side; otherwise
/// a clear age gap favors the newer side; otherwise ask.
pub fn suggest_resolution(a: &MemoryObject, b: &MemoryObject) -> Resolution {
    if a.confidence_tier() != b.confidence_tier() {
        return Resolution::KeepGrounded;
    }
    if (a.created_at - b.created_at).abs() > Duration::hours(24) {
        return Resolution::KeepNewer;
    }
    Resolution::AskUser
}
