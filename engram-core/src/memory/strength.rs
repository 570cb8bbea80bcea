use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{ARCHIVABLE_THRESHOLD, STRENGTH_FLOOR};

/// Per-object strength in `[FLOOR, 1.0]`. Decays with inactivity,
/// reinforced on access, never drops below the floor.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Strength(f64);

impl Strength {
    /// Lower bound that decay can never cross.
    pub const FLOOR: f64 = STRENGTH_FLOOR;

    /// Create a new Strength, clamping to `[FLOOR, 1.0]`.
    pub fn new(value: f64) -> Self {
        Self(value.clamp(Self::FLOOR, 1.0))
    }

    /// Get the raw f64 value.
    pub fn value(self) -> f64 {
        self.0
    }

    /// Whether this strength marks the object as an archival candidate.
    pub fn is_archivable(self) -> bool {
        self.0 < ARCHIVABLE_THRESHOLD
    }
}

impl Default for Strength {
    fn default() -> Self {
        Self(1.0)
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

impl From<f64> for Strength {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Strength> for f64 {
    fn from(s: Strength) -> Self {
        s.0
    }
}

/// Usefulness score in `[0.0, 1.0]`; 0.5 is neutral. Scales the effective
/// retrieval score from 0.5x (unhelpful) to 1.5x (helpful).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct OutcomeScore(f64);

impl OutcomeScore {
    /// Neutral midpoint.
    pub const NEUTRAL: f64 = 0.5;

    /// Create a new OutcomeScore, clamping to `[0.0, 1.0]`.
    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    /// Get the raw f64 value.
    pub fn value(self) -> f64 {
        self.0
    }

    /// Multiplier applied to a base relevance score: `0.5 + outcome`.
    pub fn multiplier(self) -> f64 {
        0.5 + self.0
    }
}

impl Default for OutcomeScore {
    fn default() -> Self {
        Self(Self::NEUTRAL)
    }
}

impl fmt::Display for OutcomeScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

impl From<f64> for OutcomeScore {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<OutcomeScore> for f64 {
    fn from(o: OutcomeScore) -> Self {
        o.0
    }
}
