use std::sync::Arc;

use engram::{
    staleness_report, DisclosureLevel, Engram, EngramConfig, EngramError, EventType, NewEvent,
    ObjectDraft, ObjectType, PackRequest, SearchOptions,
};

fn engine() -> Engram {
    Engram::open_in_memory(EngramConfig::default()).unwrap()
}

fn turn(session: &str, content: &str) -> NewEvent {
    NewEvent::new(session, EventType::Turn, content)
}

// ── Sessions ─────────────────────────────────────────────────────────────

#[test]
fn session_lifecycle_round_trips() {
    let engine = engine();
    let session = engine.session_start("/work/api").unwrap();
    assert!(session.is_open());

    let ended = engine.session_end(&session.id).unwrap();
    assert!(ended.ended_at.is_some());

    let err = engine.session_end("missing").unwrap_err();
    assert!(matches!(err, EngramError::NotFound(_)));
}

// ── Ingest → checkpoint → search ─────────────────────────────────────────

#[test]
fn corrections_survive_the_full_loop() {
    let engine = engine();
    let session = engine.session_start("/work/api").unwrap();

    engine
        .ingest(turn(&session.id, "[user]: Set up the database schema"))
        .unwrap();
    engine
        .ingest(turn(&session.id, "[user]: Never run migrations on production directly"))
        .unwrap();

    let outcome = engine.checkpoint(&session.id, "end of task").unwrap();
    assert!(outcome.memories_created >= 1);

    let hits = engine
        .search("migrations production", &SearchOptions::default())
        .unwrap();
    assert!(!hits.is_empty());
    assert!(hits[0].0.content.contains("migrations"));

    // The session records what curation produced.
    let session = engine.session(&session.id).unwrap();
    assert!(session.objects_created >= 1);
}

#[test]
fn auto_checkpoint_fires_at_the_event_threshold() {
    let engine = engine();
    let session = engine.session_start("/work/api").unwrap();

    let mut checkpointed = false;
    for i in 0..10 {
        let receipt = engine
            .ingest(turn(&session.id, &format!("[user]: step number {i}")))
            .unwrap();
        checkpointed |= receipt.checkpoint.is_some();
    }
    assert!(checkpointed);

    let session = engine.session(&session.id).unwrap();
    assert_eq!(session.events_since_checkpoint, 0);
}

// ── S5: pack injection dedupes against the session ───────────────────────

#[test]
fn packs_prefer_hot_memories_and_dedupe_injections() {
    let engine = engine();
    let session = engine.session_start("/work/api").unwrap();

    let hot1 = engine
        .add(ObjectDraft::new(ObjectType::Constraint, "Never commit secrets"))
        .unwrap();
    let hot2 = engine
        .add(ObjectDraft::new(ObjectType::Constraint, "All endpoints need auth"))
        .unwrap();
    let cold1 = engine
        .add(ObjectDraft::new(ObjectType::Constraint, "Prefer small pull requests"))
        .unwrap();
    let cold2 = engine
        .add(ObjectDraft::new(ObjectType::Constraint, "Squash merge feature branches"))
        .unwrap();

    // Heat up two of them through real retrieval access.
    for _ in 0..3 {
        engine
            .search("commit secrets", &SearchOptions { limit: 1, ..Default::default() })
            .unwrap();
        engine
            .search("endpoints auth", &SearchOptions { limit: 1, ..Default::default() })
            .unwrap();
    }

    let pack = engine
        .pack(
            Some(&session.id),
            &PackRequest { level: DisclosureLevel::Minimal, ..Default::default() },
        )
        .unwrap();

    let ids: Vec<&str> = pack.objects.iter().map(|o| o.id.as_str()).collect();
    assert!(ids.contains(&hot1.id.as_str()));
    assert!(ids.contains(&hot2.id.as_str()));
    // Hot memories come before cold ones.
    let pos = |id: &str| ids.iter().position(|x| *x == id).unwrap();
    assert!(pos(&hot1.id) < pos(&cold1.id).min(pos(&cold2.id)));
    assert!(pack.tokens_used > 0);

    // A second pack must not re-inject what the session already has.
    let second = engine
        .pack(
            Some(&session.id),
            &PackRequest { level: DisclosureLevel::Minimal, ..Default::default() },
        )
        .unwrap();
    assert!(second.objects.is_empty());

    let session = engine.session(&session.id).unwrap();
    assert!(session.was_injected(&hot1.id));
    assert!(session.was_injected(&cold1.id));
}

#[test]
fn pack_respects_the_token_budget() {
    let engine = engine();
    for i in 0..50 {
        engine
            .add(ObjectDraft::new(
                ObjectType::Constraint,
                format!("Constraint number {i} about how the build pipeline must behave"),
            ))
            .unwrap();
    }

    let pack = engine
        .pack(None, &PackRequest { level: DisclosureLevel::Minimal, ..Default::default() })
        .unwrap();
    assert!(pack.tokens_used <= 200);
    assert!(pack.objects.len() < 50);
}

#[test]
fn deep_pack_counts_evidence_excerpts() {
    let engine = engine();
    let session = engine.session_start("/work/api").unwrap();
    engine
        .ingest(turn(&session.id, "[user]: Don't hand-roll retry loops, use the middleware"))
        .unwrap();
    engine.checkpoint(&session.id, "capture").unwrap();

    let pack = engine
        .pack(
            None,
            &PackRequest {
                level: DisclosureLevel::Deep,
                query: Some("retry middleware".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(!pack.objects.is_empty());
}

// ── Disclosure checks ────────────────────────────────────────────────────

#[test]
fn recall_phrasing_escalates_to_deep() {
    let engine = engine();
    let session = engine.session_start("/work/api").unwrap();

    let check = engine
        .disclose_check(&session.id, Some("remind me what we decided about auth"), None)
        .unwrap();
    assert!(check.needed);
    assert_eq!(check.suggested_level, Some(DisclosureLevel::Deep));
}

#[test]
fn cadence_triggers_after_enough_events() {
    let engine = engine();
    let session = engine.session_start("/work/api").unwrap();

    for i in 0..15 {
        engine
            .ingest(turn(&session.id, &format!("assistant: working on it {i}")))
            .unwrap();
    }

    let check = engine.disclose_check(&session.id, None, None).unwrap();
    assert!(check.needed);
    assert_eq!(check.trigger.as_deref(), Some("cadence"));
}

// ── Object lifecycle through the facade ──────────────────────────────────

#[test]
fn supersede_and_conflict_scan() {
    let engine = engine();
    let old = engine
        .add(ObjectDraft::new(ObjectType::Decision, "Use yarn for package installs"))
        .unwrap();
    let new = engine
        .supersede(&old.id, ObjectDraft::new(ObjectType::Decision, "Use pnpm for package installs"))
        .unwrap();

    // The superseded pair never shows up as a conflict.
    assert!(engine.find_conflicts().unwrap().is_empty());

    let old = engine.get(&old.id).unwrap();
    assert_eq!(old.superseded_by.as_deref(), Some(new.id.as_str()));
}

#[test]
fn verify_then_staleness_report() {
    let engine = engine();
    let object = engine
        .add(ObjectDraft::new(ObjectType::Environment, "CI runs on ubuntu 24.04"))
        .unwrap();

    let report = staleness_report(&engine).unwrap();
    assert!(report
        .needs_verification
        .iter()
        .any(|s| s.id == object.id));

    engine.verify(&object.id).unwrap();
    let report = staleness_report(&engine).unwrap();
    assert!(!report.needs_verification.iter().any(|s| s.id == object.id));
}

// ── Stats ────────────────────────────────────────────────────────────────

#[test]
fn stats_reflect_activity() {
    let engine = engine();
    let session = engine.session_start("/work/api").unwrap();
    engine.ingest(turn(&session.id, "hello there")).unwrap();
    engine
        .add(ObjectDraft::new(ObjectType::Fact, "the api lives in crates/api"))
        .unwrap();

    let stats = engine.stats().unwrap();
    assert_eq!(stats.store.events, 1);
    assert_eq!(stats.store.objects_active, 1);
    assert_eq!(stats.open_sessions, 1);
}

// ── Per-root registry ────────────────────────────────────────────────────

#[test]
fn registry_shares_one_engine_per_root() {
    let dir = tempfile::tempdir().unwrap();

    let a = engram::registry::open_shared(dir.path(), EngramConfig::default()).unwrap();
    let b = engram::registry::open_shared(dir.path(), EngramConfig::default()).unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    assert!(engram::registry::close(dir.path()));
    assert!(!engram::registry::close(dir.path()));

    // Reopening after close sees the same database file.
    let session = a.session_start("/work").unwrap();
    let c = engram::registry::open_shared(dir.path(), EngramConfig::default()).unwrap();
    assert!(!Arc::ptr_eq(&a, &c));
    assert!(c.session(&session.id).is_ok());
}

// ── Fire-and-forget ingestion ────────────────────────────────────────────

#[test]
fn ingest_queue_drains_on_close() {
    let engine = Arc::new(engine());
    let session = engine.session_start("/work/api").unwrap();

    let queue = engram::IngestQueue::spawn(Arc::clone(&engine), 8);
    for i in 0..20 {
        queue
            .submit(turn(&session.id, &format!("queued message {i}")))
            .unwrap();
    }
    queue.close().unwrap();

    let stats = engine.stats().unwrap();
    assert_eq!(stats.store.events, 20);
}
