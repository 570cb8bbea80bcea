use chrono::{DateTime, Utc};

use engram_core::constants::{
    ARCHIVABLE_THRESHOLD, DECAY_RATE, REINFORCE_BOOST, STRENGTH_FLOOR,
};
use engram_core::memory::{OutcomeScore, Strength};

/// Tunable decay parameters.
#[derive(Debug, Clone, Copy)]
pub struct DecayParams {
    /// Exponential rate per day of inactivity.
    pub rate: f64,
    /// Strength never decays below this.
    pub floor: f64,
    /// Strength added per reinforcing access.
    pub boost: f64,
    /// Below this, an object is an archival candidate.
    pub archivable_threshold: f64,
}

impl Default for DecayParams {
    fn default() -> Self {
        Self {
            rate: DECAY_RATE,
            floor: STRENGTH_FLOOR,
            boost: REINFORCE_BOOST,
            archivable_threshold: ARCHIVABLE_THRESHOLD,
        }
    }
}

/// Decayed strength after inactivity since `anchor`.
///
/// Negative elapsed time (clock skew) is treated as zero, so decay is
/// non-increasing in `now` and bounded below by the floor.
pub fn decayed_strength(
    s0: Strength,
    anchor: DateTime<Utc>,
    now: DateTime<Utc>,
    params: &DecayParams,
) -> Strength {
    let days = (now - anchor).num_seconds().max(0) as f64 / 86_400.0;
    let decayed = s0.value() * (-params.rate * days).exp();
    Strength::new(decayed.max(params.floor))
}

/// Strength after one reinforcing access: `min(1.0, s + boost)`.
pub fn reinforce(s: Strength, boost: f64) -> Strength {
    Strength::new(s.value() + boost)
}

/// Effective retrieval score: `base * strength * (0.5 + outcome)`.
///
/// At the neutral outcome 0.5 this is exactly `base * strength`; a fully
/// helpful memory scores 1.5x, a fully unhelpful one 0.5x.
pub fn effective_score(base: f64, strength: Strength, outcome: OutcomeScore) -> f64 {
    base * strength.value() * outcome.multiplier()
}

/// Per-factor breakdown for debugging/observability.
#[derive(Debug, Clone, Copy)]
pub struct DecayBreakdown {
    pub initial: f64,
    pub days_inactive: f64,
    pub decay_multiplier: f64,
    pub floored: bool,
    pub final_strength: f64,
}

/// Compute decay with a full breakdown of each factor.
pub fn compute_breakdown(
    s0: Strength,
    anchor: DateTime<Utc>,
    now: DateTime<Utc>,
    params: &DecayParams,
) -> DecayBreakdown {
    let days = (now - anchor).num_seconds().max(0) as f64 / 86_400.0;
    let multiplier = (-params.rate * days).exp();
    let raw = s0.value() * multiplier;
    let final_strength = raw.max(params.floor);

    DecayBreakdown {
        initial: s0.value(),
        days_inactive: days,
        decay_multiplier: multiplier,
        floored: raw < params.floor,
        final_strength,
    }
}
