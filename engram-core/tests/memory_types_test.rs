use chrono::{Duration, Utc};
use engram_core::memory::*;

fn base_object() -> MemoryObject {
    let now = Utc::now();
    MemoryObject {
        id: "m1".to_string(),
        content: "Use rustfmt before committing".to_string(),
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
        created_at: now,
        updated_at: now,
        last_accessed: None,
        access_count: 0,
        strength: Strength::default(),
        last_reinforced_at: None,
        outcome_score: OutcomeScore::default(),
        last_verified_at: None,
    }
}

// ── Confidence tier derivation ───────────────────────────────────────────

#[test]
fn tier_hypothesis_without_evidence_or_approval() {
    let object = base_object();
    assert_eq!(object.confidence_tier(), ConfidenceTier::Hypothesis);
}

#[test]
fn tier_observed_with_evidence() {
    let mut object = base_object();
    object.evidence_event_ids = vec!["e1".to_string()];
    assert_eq!(object.confidence_tier(), ConfidenceTier::Observed);
}

#[test]
fn tier_inferred_when_approved_without_evidence() {
    let mut object = base_object();
    object.review_status = ReviewStatus::Approved;
    assert_eq!(object.confidence_tier(), ConfidenceTier::Inferred);
}

#[test]
fn tier_grounded_when_approved_with_code_refs() {
    let mut object = base_object();
    object.review_status = ReviewStatus::Approved;
    object.code_refs = vec![CodeRef::with_line("src/lib.rs", 42)];
    assert_eq!(object.confidence_tier(), ConfidenceTier::Grounded);
}

#[test]
fn tier_grounded_when_approved_and_recently_verified() {
    let now = Utc::now();
    let mut object = base_object();
    object.review_status = ReviewStatus::Approved;
    object.last_verified_at = Some(now - Duration::days(10));
    assert_eq!(object.confidence_tier_at(now), ConfidenceTier::Grounded);

    // Verification outside the window no longer grounds it.
    object.last_verified_at = Some(now - Duration::days(45));
    assert_eq!(object.confidence_tier_at(now), ConfidenceTier::Inferred);
}

#[test]
fn tier_is_pure_in_time() {
    let now = Utc::now();
    let mut object = base_object();
    object.review_status = ReviewStatus::Approved;
    object.last_verified_at = Some(now - Duration::days(29));
    assert_eq!(object.confidence_tier_at(now), ConfidenceTier::Grounded);
    assert_eq!(
        object.confidence_tier_at(now + Duration::days(5)),
        ConfidenceTier::Inferred
    );
}

// ── Status transitions ───────────────────────────────────────────────────

#[test]
fn status_transitions_forward_only() {
    use ObjectStatus::*;
    assert!(Active.can_transition_to(Superseded));
    assert!(Active.can_transition_to(Retired));
    assert!(Superseded.can_transition_to(Retired));

    assert!(!Retired.can_transition_to(Active));
    assert!(!Retired.can_transition_to(Superseded));
    assert!(!Superseded.can_transition_to(Active));
    assert!(!Active.can_transition_to(Active));
}

// ── Strength and outcome newtypes ────────────────────────────────────────

#[test]
fn strength_clamps_to_floor_and_ceiling() {
    assert_eq!(Strength::new(5.0).value(), 1.0);
    assert_eq!(Strength::new(0.0).value(), Strength::FLOOR);
    assert_eq!(Strength::new(-1.0).value(), Strength::FLOOR);
    assert!(Strength::new(0.05).is_archivable());
    assert!(!Strength::new(0.5).is_archivable());
}

#[test]
fn outcome_multiplier_spans_half_to_threehalves() {
    assert_eq!(OutcomeScore::new(0.5).multiplier(), 1.0);
    assert_eq!(OutcomeScore::new(0.0).multiplier(), 0.5);
    assert_eq!(OutcomeScore::new(1.0).multiplier(), 1.5);
    assert_eq!(OutcomeScore::new(7.0).value(), 1.0);
}

// ── Supersession links ───────────────────────────────────────────────────

#[test]
fn supersession_linked_is_symmetric() {
    let mut a = base_object();
    let mut b = base_object();
    b.id = "m2".to_string();

    assert!(!a.supersession_linked(&b));

    a.superseded_by = Some("m2".to_string());
    b.supersedes = vec!["m1".to_string()];
    assert!(a.supersession_linked(&b));
    assert!(b.supersession_linked(&a));
}

// ── Serde shapes ─────────────────────────────────────────────────────────

#[test]
fn enums_serialize_snake_case() {
    assert_eq!(
        serde_json::to_string(&ObjectType::Constraint).unwrap(),
        "\"constraint\""
    );
    assert_eq!(
        serde_json::to_string(&ObjectStatus::Superseded).unwrap(),
        "\"superseded\""
    );
    assert_eq!(
        serde_json::to_string(&ConfidenceTier::Grounded).unwrap(),
        "\"grounded\""
    );
}
