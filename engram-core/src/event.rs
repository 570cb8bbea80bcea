//! Events — the immutable, append-only record of what happened in a session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kinds of journal events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A conversational turn (user or assistant).
    #[default]
    Turn,
    /// The agent invoked a tool.
    ToolCall,
    /// A tool produced output.
    ToolOutput,
    /// An error surfaced to the agent.
    Error,
    /// A code diff was applied.
    Diff,
    /// A test-runner summary line.
    TestSummary,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Turn => "turn",
            EventType::ToolCall => "tool_call",
            EventType::ToolOutput => "tool_output",
            EventType::Error => "error",
            EventType::Diff => "diff",
            EventType::TestSummary => "test_summary",
        }
    }

    /// Parse from the stored string form. Unknown strings fall back to `Turn`.
    pub fn parse_name(s: &str) -> Self {
        match s {
            "tool_call" => EventType::ToolCall,
            "tool_output" => EventType::ToolOutput,
            "error" => EventType::Error,
            "diff" => EventType::Diff,
            "test_summary" => EventType::TestSummary,
            _ => EventType::Turn,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A journal event. Never mutated or deleted after append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// UUID v4 identifier.
    pub id: String,
    /// Session this event belongs to.
    pub session_id: String,
    /// When the event happened.
    pub timestamp: DateTime<Utc>,
    /// Kind of event.
    pub event_type: EventType,
    /// Full content. Reconstructed from the blob table when spilled.
    pub content: String,
    /// Blob row id when the content was stored out of line.
    pub blob_id: Option<i64>,
    /// Short synopsis, present only for blobbed content.
    pub synopsis: Option<String>,
    /// Tool that produced this event, if any.
    pub tool_name: Option<String>,
    /// File the event concerns, if any.
    pub file_path: Option<String>,
    /// Process exit code for tool outputs.
    pub exit_code: Option<i32>,
    /// 16-hex-char hash of the normalized content. Dedup key within a session.
    pub content_hash: String,
    /// Token count of the content, when known.
    pub token_count: Option<i64>,
}

/// Input for appending an event. Missing fields are filled by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewEvent {
    pub session_id: String,
    pub event_type: EventType,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub exit_code: Option<i32>,
    /// Precomputed hash; computed from the content when absent.
    #[serde(default)]
    pub content_hash: Option<String>,
}

impl NewEvent {
    /// Convenience constructor for the common case.
    pub fn new(session_id: impl Into<String>, event_type: EventType, content: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            event_type,
            content: content.into(),
            ..Default::default()
        }
    }
}
