//! Session records and the disclosure ladder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How much context a pack carries. Levels escalate, never skip downward
/// mid-session unless the host asks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DisclosureLevel {
    /// ~200 tokens: active constraints only.
    #[default]
    Minimal,
    /// ~500 tokens: minimal plus task-relevant memories.
    Task,
    /// ~1500 tokens: task plus evidence excerpts and recent decisions.
    Deep,
}

impl DisclosureLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisclosureLevel::Minimal => "minimal",
            DisclosureLevel::Task => "task",
            DisclosureLevel::Deep => "deep",
        }
    }

    pub fn parse_name(s: &str) -> Option<Self> {
        match s {
            "minimal" => Some(DisclosureLevel::Minimal),
            "task" => Some(DisclosureLevel::Task),
            "deep" => Some(DisclosureLevel::Deep),
            _ => None,
        }
    }

    /// The next level up; `Deep` saturates.
    pub fn escalate(self) -> Self {
        match self {
            DisclosureLevel::Minimal => DisclosureLevel::Task,
            DisclosureLevel::Task | DisclosureLevel::Deep => DisclosureLevel::Deep,
        }
    }
}

impl std::fmt::Display for DisclosureLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A host-agent session. Mirrored between the in-memory manager and the
/// `sessions` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub working_directory: String,
    /// Total events ingested.
    pub events_count: u64,
    /// Memory objects created on behalf of this session.
    pub objects_created: u64,
    /// Events since the last checkpoint drain.
    pub events_since_checkpoint: u64,
    /// Consecutive error-ish events observed.
    pub error_count: u64,
    /// Memory ids already injected into this session's context.
    pub injected_memory_ids: Vec<String>,
    /// Current disclosure level.
    pub disclosure_level: DisclosureLevel,
    /// Directory of the last working file, for topic-shift detection.
    pub last_topic: Option<String>,
    /// When context was last disclosed to the host.
    pub last_disclosure_at: Option<DateTime<Utc>>,
    /// Events at the time of the last disclosure.
    pub events_at_last_disclosure: u64,
}

impl Session {
    /// Fresh session rooted at a working directory.
    pub fn new(id: impl Into<String>, working_directory: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            started_at: Utc::now(),
            ended_at: None,
            working_directory: working_directory.into(),
            events_count: 0,
            objects_created: 0,
            events_since_checkpoint: 0,
            error_count: 0,
            injected_memory_ids: Vec::new(),
            disclosure_level: DisclosureLevel::default(),
            last_topic: None,
            last_disclosure_at: None,
            events_at_last_disclosure: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Whether a memory id was already injected this session.
    pub fn was_injected(&self, memory_id: &str) -> bool {
        self.injected_memory_ids.iter().any(|id| id == memory_id)
    }

    /// Events seen since the last disclosure.
    pub fn events_since_disclosure(&self) -> u64 {
        self.events_count.saturating_sub(self.events_at_last_disclosure)
    }
}
