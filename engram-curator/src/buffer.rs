//! Per-session event buffer with auto-trigger evaluation on every add.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use engram_core::config::EngramConfig;
use engram_core::constants::{TOOL_BURST_COUNT, TOOL_BURST_WINDOW_SECS};
use engram_core::event::{Event, EventType};

/// Why a checkpoint fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointTrigger {
    /// Buffer reached the event cadence.
    EventThreshold,
    /// Many tool outputs inside the sliding window.
    ToolBurst,
    /// A clean exit after a failure in the same episode.
    TaskComplete,
    /// Consecutive failures.
    ErrorBurst,
    /// Explicit request.
    Manual,
}

impl CheckpointTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointTrigger::EventThreshold => "event_threshold",
            CheckpointTrigger::ToolBurst => "tool_burst",
            CheckpointTrigger::TaskComplete => "task_complete",
            CheckpointTrigger::ErrorBurst => "error_burst",
            CheckpointTrigger::Manual => "manual",
        }
    }
}

impl std::fmt::Display for CheckpointTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// In-memory buffer of one session's events since its last checkpoint.
#[derive(Debug)]
pub struct EventBuffer {
    events: Vec<Event>,
    tool_output_times: Vec<DateTime<Utc>>,
    consecutive_errors: usize,
    min_events: usize,
    error_burst_threshold: usize,
    tool_burst_count: usize,
    tool_burst_window: Duration,
}

impl EventBuffer {
    pub fn new(config: &EngramConfig) -> Self {
        Self {
            events: Vec::new(),
            tool_output_times: Vec::new(),
            consecutive_errors: 0,
            min_events: config.auto_checkpoint_threshold,
            error_burst_threshold: config.error_burst_threshold,
            tool_burst_count: TOOL_BURST_COUNT,
            tool_burst_window: Duration::seconds(TOOL_BURST_WINDOW_SECS),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Append an event and evaluate auto-triggers. Burst triggers are
    /// checked before the plain cadence so the more specific reason wins.
    pub fn add_event(&mut self, event: Event) -> Option<CheckpointTrigger> {
        if event.event_type == EventType::ToolOutput {
            self.tool_output_times.push(event.timestamp);
            let cutoff = event.timestamp - self.tool_burst_window;
            self.tool_output_times.retain(|t| *t >= cutoff);
        }

        let failed = event.event_type == EventType::Error
            || event.exit_code.is_some_and(|c| c != 0);
        let task_completed = event.exit_code == Some(0)
            && event.event_type == EventType::ToolOutput
            && self.has_failure();

        if failed {
            self.consecutive_errors += 1;
        } else if event.exit_code == Some(0) {
            self.consecutive_errors = 0;
        }

        self.events.push(event);

        if self.consecutive_errors >= self.error_burst_threshold {
            return Some(CheckpointTrigger::ErrorBurst);
        }
        if self.tool_output_times.len() >= self.tool_burst_count {
            return Some(CheckpointTrigger::ToolBurst);
        }
        if task_completed {
            return Some(CheckpointTrigger::TaskComplete);
        }
        if self.events.len() >= self.min_events && self.events.len() % self.min_events == 0 {
            return Some(CheckpointTrigger::EventThreshold);
        }
        None
    }

    /// Whether the buffer holds enough events for an auto-checkpoint.
    pub fn meets_minimum(&self) -> bool {
        self.events.len() >= self.min_events
    }

    /// Take every buffered event, resetting all trigger state.
    pub fn drain(&mut self) -> Vec<Event> {
        self.tool_output_times.clear();
        self.consecutive_errors = 0;
        std::mem::take(&mut self.events)
    }

    fn has_failure(&self) -> bool {
        self.events
            .iter()
            .any(|e| e.exit_code.is_some_and(|c| c != 0))
    }
}
