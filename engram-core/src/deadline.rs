//! Cooperative cancellation for suspension points (embedding, extraction,
//! external IO). Checked between retriever branches and before
//! transactional writes; expiry surfaces as `EngramError::Cancelled` and
//! in-flight transactions roll back.

use std::time::{Duration, Instant};

use crate::errors::{EngramError, EngramResult};

/// A point in time after which work must stop. `Deadline::none()` never expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// A deadline that never expires.
    pub fn none() -> Self {
        Self(None)
    }

    /// Expires after `d` from now.
    pub fn after(d: Duration) -> Self {
        Self(Some(Instant::now() + d))
    }

    /// Expires after `ms` milliseconds from now.
    pub fn in_millis(ms: u64) -> Self {
        Self::after(Duration::from_millis(ms))
    }

    /// Whether the deadline has passed.
    pub fn expired(&self) -> bool {
        self.0.is_some_and(|t| Instant::now() >= t)
    }

    /// Time left, if bounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.0.map(|t| t.saturating_duration_since(Instant::now()))
    }

    /// Err(`Cancelled`) when expired, labeled with the interrupted operation.
    pub fn check(&self, what: &str) -> EngramResult<()> {
        if self.expired() {
            Err(EngramError::Cancelled(format!("deadline expired during {what}")))
        } else {
            Ok(())
        }
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::none()
    }
}
