use chrono::{Duration, Utc};
use engram_core::memory::{OutcomeScore, Strength};
use engram_decay::formula::{self, DecayParams};
use proptest::prelude::*;

// ── Decay monotonicity ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn decay_is_non_increasing_in_time(
        s0 in 0.011f64..=1.0,
        days in proptest::collection::vec(0i64..730, 1..20),
    ) {
        let params = DecayParams::default();
        let anchor = Utc::now();
        let mut sorted = days;
        sorted.sort_unstable();

        let mut prev = f64::INFINITY;
        for d in sorted {
            let s = formula::decayed_strength(
                Strength::new(s0), anchor, anchor + Duration::days(d), &params,
            ).value();
            prop_assert!(s <= prev + f64::EPSILON, "decay increased at day {}: {} > {}", d, s, prev);
            prev = s;
        }
    }
}

// ── Floor bound ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn decay_is_bounded_by_floor_and_start(
        s0 in 0.011f64..=1.0,
        d in 0i64..100_000,
    ) {
        let params = DecayParams::default();
        let anchor = Utc::now();
        let s = formula::decayed_strength(
            Strength::new(s0), anchor, anchor + Duration::days(d), &params,
        ).value();
        prop_assert!(s >= params.floor);
        prop_assert!(s <= s0 + f64::EPSILON);
    }
}

// ── Clock skew safety ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn negative_elapsed_time_does_not_boost(
        s0 in 0.011f64..=1.0,
        d in 1i64..1000,
    ) {
        let params = DecayParams::default();
        let anchor = Utc::now();
        // "now" before the anchor must not grow strength.
        let s = formula::decayed_strength(
            Strength::new(s0), anchor, anchor - Duration::days(d), &params,
        ).value();
        prop_assert!((s - Strength::new(s0).value()).abs() < 1e-9);
    }
}

// ── Reinforcement bounds ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn reinforcement_is_monotone_and_capped(
        s in 0.011f64..=1.0,
        boost in 0.0f64..=1.0,
    ) {
        let reinforced = formula::reinforce(Strength::new(s), boost).value();
        prop_assert!(reinforced >= Strength::new(s).value() - f64::EPSILON);
        prop_assert!(reinforced <= 1.0);
    }
}

// ── Effective score linearity at the neutral outcome ─────────────────────

proptest! {
    #[test]
    fn neutral_outcome_is_identity_multiplier(
        base in 0.0f64..=1.0,
        s in 0.011f64..=1.0,
    ) {
        let effective = formula::effective_score(
            base, Strength::new(s), OutcomeScore::new(0.5),
        );
        prop_assert!((effective - base * Strength::new(s).value()).abs() < 1e-9);
    }
}
