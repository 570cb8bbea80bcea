use engram_core::config::EngramConfig;
use engram_core::errors::EngramError;
use engram_core::event::{EventType, NewEvent};
use engram_core::memory::{ObjectDraft, ObjectFilter, ObjectStatus, ObjectType};
use engram_extract::normalizer::content_hash;
use engram_storage::MemoryStore;

fn store() -> MemoryStore {
    MemoryStore::open_in_memory(EngramConfig::default()).unwrap()
}

fn session_id(store: &MemoryStore) -> String {
    store.create_session("/work/project").unwrap().id
}

fn turn(session: &str, content: &str) -> NewEvent {
    NewEvent::new(session, EventType::Turn, content)
}

// ── Event journal ────────────────────────────────────────────────────────

#[test]
fn append_fills_id_timestamp_and_hash() {
    let store = store();
    let session = session_id(&store);

    let event = store.append_event(turn(&session, "Switch the CI to nextest")).unwrap();
    assert!(!event.id.is_empty());
    assert_eq!(event.content_hash, content_hash("Switch the CI to nextest"));
    assert!(event.token_count.unwrap() > 0);

    let fetched = store.get_event(&event.id).unwrap().unwrap();
    assert_eq!(fetched.content, "Switch the CI to nextest");
}

#[test]
fn duplicate_content_in_session_returns_prior_event() {
    let store = store();
    let session = session_id(&store);

    let first = store.append_event(turn(&session, "use  tabs")).unwrap();
    // Same content post-normalization (whitespace and case differ).
    let second = store.append_event(turn(&session, "Use Tabs")).unwrap();
    assert_eq!(first.id, second.id);

    // No duplicate FTS row either: one hit, not two.
    let hits = store.search_events_fts("tabs", 10).unwrap();
    assert_eq!(hits.len(), 1);

    // A different session gets its own event.
    let other = session_id(&store);
    let third = store.append_event(turn(&other, "use tabs")).unwrap();
    assert_ne!(first.id, third.id);
}

#[test]
fn append_requires_known_session() {
    let store = store();
    let err = store.append_event(turn("nope", "hello world")).unwrap_err();
    assert!(matches!(err, EngramError::InvalidInput(_)));
}

#[test]
fn oversized_content_spills_to_blob_and_reads_back() {
    let store = store();
    let session = session_id(&store);

    let body = "x".repeat(5000);
    let event = store
        .append_event(NewEvent::new(&session, EventType::ToolOutput, body.clone()))
        .unwrap();
    assert!(event.synopsis.is_some());

    let fetched = store.get_event(&event.id).unwrap().unwrap();
    assert_eq!(fetched.content, body);
    assert!(fetched.blob_id.is_some());
}

#[test]
fn session_counters_track_appends_and_errors() {
    let store = store();
    let session = session_id(&store);

    store.append_event(turn(&session, "first")).unwrap();
    let mut fail = NewEvent::new(&session, EventType::ToolOutput, "boom");
    fail.exit_code = Some(1);
    store.append_event(fail).unwrap();

    let loaded = store.get_session(&session).unwrap().unwrap();
    assert_eq!(loaded.events_count, 2);
    assert_eq!(loaded.events_since_checkpoint, 2);
    assert_eq!(loaded.error_count, 1);

    // A clean exit resets the consecutive error count.
    let mut ok = NewEvent::new(&session, EventType::ToolOutput, "fixed");
    ok.exit_code = Some(0);
    store.append_event(ok).unwrap();
    let loaded = store.get_session(&session).unwrap().unwrap();
    assert_eq!(loaded.error_count, 0);
}

#[test]
fn events_since_checkpoint_honors_the_high_water_mark() {
    let store = store();
    let session = session_id(&store);

    store.append_event(turn(&session, "before one")).unwrap();
    store.append_event(turn(&session, "before two")).unwrap();
    store.mark_checkpoint(&session).unwrap();
    store.append_event(turn(&session, "after one")).unwrap();

    let after = store.events_since_checkpoint(&session).unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].content, "after one");
}

// ── Object store ─────────────────────────────────────────────────────────

#[test]
fn create_fills_defaults() {
    let store = store();
    let object = store
        .create_object(ObjectDraft::new(ObjectType::Constraint, "Never force-push main"))
        .unwrap();

    assert_eq!(object.status, ObjectStatus::Active);
    assert_eq!(object.strength.value(), 1.0);
    assert_eq!(object.outcome_score.value(), 0.5);
    assert_eq!(object.access_count, 0);

    let fetched = store.get_object(&object.id).unwrap().unwrap();
    assert_eq!(fetched.content, "Never force-push main");
}

#[test]
fn create_rejects_unknown_evidence() {
    let store = store();
    let mut draft = ObjectDraft::new(ObjectType::Fact, "something happened");
    draft.evidence_event_ids = vec!["ghost-event".to_string()];
    let err = store.create_object(draft).unwrap_err();
    assert!(matches!(err, EngramError::InvalidInput(_)));
}

#[test]
fn supersede_links_both_sides_atomically() {
    let store = store();
    let old = store
        .create_object(ObjectDraft::new(ObjectType::Decision, "Use yarn for installs"))
        .unwrap();
    let new = store
        .supersede(&old.id, ObjectDraft::new(ObjectType::Decision, "Use pnpm for installs"))
        .unwrap();

    let old = store.get_object(&old.id).unwrap().unwrap();
    assert_eq!(old.status, ObjectStatus::Superseded);
    assert_eq!(old.superseded_by.as_deref(), Some(new.id.as_str()));
    assert!(new.supersedes.contains(&old.id));
    assert_eq!(new.status, ObjectStatus::Active);
}

#[test]
fn superseded_objects_cannot_be_superseded_again() {
    let store = store();
    let a = store
        .create_object(ObjectDraft::new(ObjectType::Decision, "alpha"))
        .unwrap();
    store
        .supersede(&a.id, ObjectDraft::new(ObjectType::Decision, "beta"))
        .unwrap();

    let err = store
        .supersede(&a.id, ObjectDraft::new(ObjectType::Decision, "gamma"))
        .unwrap_err();
    assert!(matches!(err, EngramError::Conflict(_)));
}

#[test]
fn retire_is_terminal_and_idempotent() {
    let store = store();
    let object = store
        .create_object(ObjectDraft::new(ObjectType::Preference, "dark mode"))
        .unwrap();

    let retired = store.retire(&object.id).unwrap();
    assert_eq!(retired.status, ObjectStatus::Retired);
    // Second retire is a no-op, not an error.
    let again = store.retire(&object.id).unwrap();
    assert_eq!(again.status, ObjectStatus::Retired);

    let err = store
        .supersede(&object.id, ObjectDraft::new(ObjectType::Preference, "light mode"))
        .unwrap_err();
    assert!(matches!(err, EngramError::Conflict(_)));
}

#[test]
fn verify_promotes_pending_review() {
    let store = store();
    let object = store
        .create_object(ObjectDraft::new(ObjectType::Environment, "postgres 16 in docker"))
        .unwrap();
    let verified = store.verify(&object.id).unwrap();

    assert!(verified.last_verified_at.is_some());
    assert_eq!(
        verified.review_status,
        engram_core::memory::ReviewStatus::Approved
    );
}

#[test]
fn reinforcement_bumps_counters_and_strength() {
    let store = store();
    let object = store
        .create_object(ObjectDraft::new(ObjectType::Convention, "squash merge only"))
        .unwrap();

    store.reinforce(&[object.id.clone()], 0.15).unwrap();

    let after = store.get_object(&object.id).unwrap().unwrap();
    assert_eq!(after.access_count, 1);
    assert!(after.last_accessed.is_some());
    assert!(after.last_reinforced_at.is_some());
    assert_eq!(after.strength.value(), 1.0); // saturates at the cap

    store.reinforce(&[object.id.clone()], 0.15).unwrap();
    let after = store.get_object(&object.id).unwrap().unwrap();
    assert_eq!(after.access_count, 2);
}

#[test]
fn list_filters_by_type_and_status() {
    let store = store();
    store
        .create_object(ObjectDraft::new(ObjectType::Constraint, "no unwrap in prod"))
        .unwrap();
    let decision = store
        .create_object(ObjectDraft::new(ObjectType::Decision, "sqlite for storage"))
        .unwrap();
    store.retire(&decision.id).unwrap();

    let constraints = store
        .list_objects(&ObjectFilter::active(ObjectType::Constraint))
        .unwrap();
    assert_eq!(constraints.len(), 1);

    let retired = store
        .list_objects(&ObjectFilter {
            status: Some(ObjectStatus::Retired),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(retired.len(), 1);
}

// ── FTS ──────────────────────────────────────────────────────────────────

#[test]
fn fts_finds_objects_and_scores_positive() {
    let store = store();
    store
        .create_object(ObjectDraft::new(ObjectType::Convention, "Indent with tabs everywhere"))
        .unwrap();
    store
        .create_object(ObjectDraft::new(ObjectType::Fact, "The deploy takes ten minutes"))
        .unwrap();

    let hits = store.search_objects_fts("tabs indentation", 10).unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].1 > 0.0);
}

#[test]
fn fts_noise_query_yields_empty_not_error() {
    let store = store();
    store
        .create_object(ObjectDraft::new(ObjectType::Fact, "anything at all"))
        .unwrap();
    let hits = store.search_objects_fts("AND OR NOT ??", 10).unwrap();
    assert!(hits.is_empty());
}

#[test]
fn fts_excludes_inactive_objects() {
    let store = store();
    let object = store
        .create_object(ObjectDraft::new(ObjectType::Decision, "ship the prototype quickly"))
        .unwrap();
    store.retire(&object.id).unwrap();

    let hits = store.search_objects_fts("prototype", 10).unwrap();
    assert!(hits.is_empty());
}

// ── Token index ──────────────────────────────────────────────────────────

#[test]
fn token_index_matches_exact_and_substring() {
    let store = store();
    let object = store
        .create_object(ObjectDraft::new(
            ObjectType::Environment,
            "Set RUST_LOG=debug when editing ci/deploy/pipeline.yml",
        ))
        .unwrap();

    let exact = store.search_tokens("export RUST_LOG first", 10).unwrap();
    assert_eq!(exact[0].0, object.id);

    // The stored path contains the shorter path from the query.
    let partial = store.search_tokens("settings live in deploy/pipeline.yml", 10).unwrap();
    assert!(partial.iter().any(|(id, _)| id == &object.id));
}

// ── Vector index ─────────────────────────────────────────────────────────

#[test]
fn vector_search_orders_by_cosine() {
    let store = store();
    let near = store
        .create_object(ObjectDraft::new(ObjectType::Fact, "close vector"))
        .unwrap();
    let far = store
        .create_object(ObjectDraft::new(ObjectType::Fact, "distant vector"))
        .unwrap();

    store.store_embedding(&near.id, &[1.0, 0.0, 0.0]).unwrap();
    store.store_embedding(&far.id, &[0.0, 1.0, 0.0]).unwrap();

    let hits = store.search_vector(&[0.9, 0.1, 0.0], 10).unwrap();
    assert_eq!(hits[0].0, near.id);
    assert!(hits[0].1 > hits.get(1).map(|h| h.1).unwrap_or(0.0));
}

#[test]
fn vector_search_skips_dimension_mismatches() {
    let store = store();
    let object = store
        .create_object(ObjectDraft::new(ObjectType::Fact, "odd dimensions"))
        .unwrap();
    store.store_embedding(&object.id, &[1.0, 0.0]).unwrap();

    let hits = store.search_vector(&[1.0, 0.0, 0.0], 10).unwrap();
    assert!(hits.is_empty());
}

// ── Heatmap and stats ────────────────────────────────────────────────────

#[test]
fn heatmap_orders_by_access_count() {
    let store = store();
    let hot = store
        .create_object(ObjectDraft::new(ObjectType::Constraint, "hot memory"))
        .unwrap();
    let cold = store
        .create_object(ObjectDraft::new(ObjectType::Constraint, "cold memory"))
        .unwrap();

    for _ in 0..3 {
        store.reinforce(&[hot.id.clone()], 0.1).unwrap();
    }
    store.reinforce(&[cold.id.clone()], 0.1).unwrap();

    let heatmap = store.heatmap(Some(10)).unwrap();
    assert_eq!(heatmap[0].id, hot.id);
    assert_eq!(heatmap.len(), 2);
}

#[test]
fn stats_count_rows() {
    let store = store();
    let session = session_id(&store);
    store.append_event(turn(&session, "one event")).unwrap();
    store
        .create_object(ObjectDraft::new(ObjectType::Fact, "one object"))
        .unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(stats.events, 1);
    assert_eq!(stats.objects_total, 1);
    assert_eq!(stats.objects_active, 1);
    assert_eq!(stats.sessions, 1);
    assert!(stats.tokens >= 1);
}
