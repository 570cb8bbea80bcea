//! # engram-decay
//!
//! Strength decay and reinforcement for memory objects.
//!
//! ```text
//! S(t)      = max(floor, S0 * exp(-rate * days_inactive))
//! S'        = min(1.0, S + boost)            // on access
//! effective = base * S(t) * (0.5 + outcome)  // retrieval composition
//! ```

pub mod formula;

pub use formula::{DecayBreakdown, DecayParams};

use chrono::{DateTime, Utc};
use engram_core::memory::{MemoryObject, Strength};

/// Decay engine carrying the tuned parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecayEngine {
    params: DecayParams,
}

impl DecayEngine {
    pub fn new(params: DecayParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &DecayParams {
        &self.params
    }

    /// Current decayed strength of an object. Inactivity is measured from
    /// `last_accessed`, falling back to `created_at`.
    pub fn decayed_strength(&self, object: &MemoryObject, now: DateTime<Utc>) -> Strength {
        let anchor = object.last_accessed.unwrap_or(object.created_at);
        formula::decayed_strength(object.strength, anchor, now, &self.params)
    }

    /// Strength after one reinforcing access.
    pub fn reinforce(&self, strength: Strength) -> Strength {
        formula::reinforce(strength, self.params.boost)
    }

    /// Effective retrieval score for an object given a base relevance score.
    pub fn effective_score(&self, base: f64, object: &MemoryObject, now: DateTime<Utc>) -> f64 {
        let decayed = self.decayed_strength(object, now);
        formula::effective_score(base, decayed, object.outcome_score)
    }

    /// Whether the decayed strength has fallen below the archival threshold.
    pub fn is_archivable(&self, object: &MemoryObject, now: DateTime<Utc>) -> bool {
        self.decayed_strength(object, now).value() < self.params.archivable_threshold
    }

    /// Per-object breakdown for observability.
    pub fn breakdown(&self, object: &MemoryObject, now: DateTime<Utc>) -> DecayBreakdown {
        let anchor = object.last_accessed.unwrap_or(object.created_at);
        formula::compute_breakdown(object.strength, anchor, now, &self.params)
    }
}

/// Re-exported free functions for callers that don't need an engine.
pub use formula::{decayed_strength, effective_score, reinforce};
