use chrono::{Duration, Utc};
use engram_core::memory::*;
use engram_decay::{DecayEngine, DecayParams};

fn make_object(strength: f64, days_since_access: i64, outcome: f64) -> MemoryObject {
    let now = Utc::now();
    MemoryObject {
        id: uuid::Uuid::new_v4().to_string(),
        content: "Deploys happen from CI only".to_string(),
        object_type: ObjectType::Convention,
        scope: Scope::project(),
        status: ObjectStatus::Active,
        confidence: ConfidenceLevel::Medium,
        supersedes: vec![],
        superseded_by: None,
        evidence_event_ids: vec![],
        evidence_excerpt: None,
        code_refs: vec![],
        review_status: ReviewStatus::Pending,
        reviewed_at: None,
        created_at: now - Duration::days(days_since_access + 30),
        updated_at: now,
        last_accessed: Some(now - Duration::days(days_since_access)),
        access_count: 1,
        strength: Strength::new(strength),
        last_reinforced_at: None,
        outcome_score: OutcomeScore::new(outcome),
        last_verified_at: None,
    }
}

// ── Decay ────────────────────────────────────────────────────────────────

#[test]
fn fresh_object_keeps_its_strength() {
    let engine = DecayEngine::default();
    let object = make_object(1.0, 0, 0.5);
    let decayed = engine.decayed_strength(&object, Utc::now()).value();
    assert!((decayed - 1.0).abs() < 1e-6);
}

#[test]
fn decay_follows_the_exponential() {
    let engine = DecayEngine::default();
    let object = make_object(1.0, 10, 0.5);
    // exp(-0.05 * 10) ≈ 0.6065
    let decayed = engine.decayed_strength(&object, Utc::now()).value();
    assert!((decayed - 0.6065).abs() < 0.01, "got {decayed}");
}

#[test]
fn decay_never_crosses_the_floor() {
    let engine = DecayEngine::default();
    let object = make_object(1.0, 10_000, 0.5);
    let decayed = engine.decayed_strength(&object, Utc::now()).value();
    assert_eq!(decayed, DecayParams::default().floor);
}

#[test]
fn decay_anchors_on_created_at_when_never_accessed() {
    let engine = DecayEngine::default();
    let now = Utc::now();
    let mut object = make_object(1.0, 0, 0.5);
    object.last_accessed = None;
    object.created_at = now - Duration::days(20);

    let decayed = engine.decayed_strength(&object, now).value();
    assert!((decayed - (-0.05f64 * 20.0).exp()).abs() < 0.01);
}

// ── Reinforcement ────────────────────────────────────────────────────────

#[test]
fn reinforcement_boosts_and_saturates() {
    let engine = DecayEngine::default();
    assert!((engine.reinforce(Strength::new(0.5)).value() - 0.65).abs() < 1e-9);
    assert_eq!(engine.reinforce(Strength::new(0.95)).value(), 1.0);
}

// ── Effective score ──────────────────────────────────────────────────────

#[test]
fn neutral_outcome_is_base_times_strength() {
    let engine = DecayEngine::default();
    let object = make_object(0.8, 0, 0.5);
    let effective = engine.effective_score(0.7, &object, Utc::now());
    assert!((effective - 0.7 * 0.8).abs() < 0.01, "got {effective}");
}

#[test]
fn outcome_scales_half_to_threehalves() {
    let engine = DecayEngine::default();
    let helpful = make_object(1.0, 0, 1.0);
    let unhelpful = make_object(1.0, 0, 0.0);
    let now = Utc::now();

    assert!((engine.effective_score(1.0, &helpful, now) - 1.5).abs() < 0.01);
    assert!((engine.effective_score(1.0, &unhelpful, now) - 0.5).abs() < 0.01);
}

// ── Archivability ────────────────────────────────────────────────────────

#[test]
fn archivable_below_threshold() {
    let engine = DecayEngine::default();
    let now = Utc::now();
    assert!(engine.is_archivable(&make_object(1.0, 100, 0.5), now));
    assert!(!engine.is_archivable(&make_object(1.0, 1, 0.5), now));
}

#[test]
fn breakdown_reports_the_factors() {
    let engine = DecayEngine::default();
    let object = make_object(0.9, 5, 0.5);
    let breakdown = engine.breakdown(&object, Utc::now());
    assert_eq!(breakdown.initial, 0.9);
    assert!(breakdown.days_inactive >= 4.9 && breakdown.days_inactive <= 5.1);
    assert!(!breakdown.floored);
}
