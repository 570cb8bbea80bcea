use chrono::{Duration, Utc};
use engram_core::memory::*;
use engram_conflict::{detect_pair, find_conflicts, ConflictKind, Resolution};

fn make_memory(content: &str, object_type: ObjectType, days_old: i64) -> MemoryObject {
    let created = Utc::now() - Duration::days(days_old);
    MemoryObject {
        id: uuid::Uuid::new_v4().to_string(),
        content: content.to_string(),
        object_type,
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
        created_at: created,
        updated_at: created,
        last_accessed: None,
        access_count: 0,
        strength: Strength::default(),
        last_reinforced_at: None,
        outcome_score: OutcomeScore::default(),
        last_verified_at: None,
    }
}

// ── Implicit conflicts (mutually exclusive picks) ────────────────────────

#[test]
fn react_vs_vue_is_an_implicit_conflict() {
    let a = make_memory("Use React for the frontend", ObjectType::Decision, 0);
    let b = make_memory("Use Vue for the frontend", ObjectType::Decision, 0);

    let conflicts = find_conflicts(&[a, b]);
    assert_eq!(conflicts.len(), 1);
    let conflict = &conflicts[0];
    assert_eq!(conflict.kind, ConflictKind::Implicit);
    assert!(conflict.confidence >= 0.8);
}

#[test]
fn same_pick_is_not_a_conflict() {
    let a = make_memory("Use postgres for persistence", ObjectType::Decision, 0);
    let b = make_memory("Use postgresql for the new service", ObjectType::Decision, 0);
    assert!(detect_pair(&a, &b).is_none());
}

#[test]
fn mere_mentions_without_recommendation_do_not_conflict() {
    let a = make_memory("The react docs mention hydration", ObjectType::Fact, 0);
    let b = make_memory("The vue playground was down", ObjectType::Fact, 0);
    assert!(detect_pair(&a, &b).is_none());
}

// ── Direct conflicts ─────────────────────────────────────────────────────

#[test]
fn negation_asymmetry_is_direct() {
    let a = make_memory("Commit generated files to the repo", ObjectType::Convention, 0);
    let b = make_memory("Never commit generated files to the repo", ObjectType::Convention, 0);

    let conflict = detect_pair(&a, &b).expect("expected a conflict");
    assert_eq!(conflict.kind, ConflictKind::Direct);
}

#[test]
fn tabs_vs_spaces_antonym_pair() {
    let a = make_memory("Indent with tabs in this codebase", ObjectType::Convention, 0);
    let b = make_memory("Indent with spaces in this codebase", ObjectType::Convention, 0);

    let conflict = detect_pair(&a, &b).expect("expected a conflict");
    assert_eq!(conflict.kind, ConflictKind::Direct);
}

// ── Temporal conflicts ───────────────────────────────────────────────────

#[test]
fn restated_decision_a_week_apart_suggests_keep_newer() {
    let old = make_memory(
        "Deploy the api service from the release branch pipeline",
        ObjectType::Decision,
        7,
    );
    let new = make_memory(
        "Deploy the api service from the main branch pipeline",
        ObjectType::Decision,
        0,
    );

    let conflict = detect_pair(&old, &new).expect("expected a conflict");
    assert_eq!(conflict.kind, ConflictKind::Temporal);
    assert_eq!(conflict.suggested_resolution, Resolution::KeepNewer);
    // The older id is listed first.
    assert_eq!(conflict.memory_ids[0], old.id);
}

#[test]
fn close_in_time_restatements_do_not_fire_temporal() {
    let a = make_memory(
        "Deploy the api service from the main branch pipeline",
        ObjectType::Decision,
        0,
    );
    let mut b = make_memory(
        "Deploy the api service from the main branch pipeline now",
        ObjectType::Decision,
        0,
    );
    b.created_at = a.created_at + Duration::hours(2);
    assert!(detect_pair(&a, &b).is_none());
}

// ── Eligibility ──────────────────────────────────────────────────────────

#[test]
fn retired_objects_are_never_paired() {
    let mut a = make_memory("Use React for the frontend", ObjectType::Decision, 0);
    let b = make_memory("Use Vue for the frontend", ObjectType::Decision, 0);
    a.status = ObjectStatus::Retired;
    assert!(detect_pair(&a, &b).is_none());
}

#[test]
fn supersession_linked_objects_are_never_paired() {
    let mut a = make_memory("Use React for the frontend", ObjectType::Decision, 2);
    let mut b = make_memory("Use Vue for the frontend", ObjectType::Decision, 0);
    a.superseded_by = Some(b.id.clone());
    b.supersedes = vec![a.id.clone()];
    assert!(detect_pair(&a, &b).is_none());
}

#[test]
fn resolution_prefers_grounded_tier() {
    let mut grounded = make_memory("Use jest for unit tests", ObjectType::Decision, 0);
    grounded.review_status = ReviewStatus::Approved;
    grounded.code_refs = vec![CodeRef::new("jest.config.js")];
    let plain = make_memory("Use vitest for unit tests", ObjectType::Decision, 0);

    let conflict = detect_pair(&grounded, &plain).expect("expected a conflict");
    assert_eq!(conflict.suggested_resolution, Resolution::KeepGrounded);
}
