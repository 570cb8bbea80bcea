use chrono::{Duration, Utc};
use engram_core::config::EngramConfig;
use engram_core::deadline::Deadline;
use engram_core::event::{EventType, NewEvent};
use engram_core::memory::{ObjectDraft, ObjectFilter, ObjectStatus, ObjectType};
use engram_core::session::Session;
use engram_curator::{CheckpointTrigger, Curator};
use engram_storage::MemoryStore;

fn setup() -> (MemoryStore, Curator, Session) {
    let store = MemoryStore::open_in_memory(EngramConfig::default()).unwrap();
    let curator = Curator::new(EngramConfig::default());
    let session = store.create_session("/work/project").unwrap();
    (store, curator, session)
}

fn ingest(
    store: &MemoryStore,
    curator: &Curator,
    session: &Session,
    new: NewEvent,
) -> Option<CheckpointTrigger> {
    let event = store.append_event(new).unwrap();
    curator.add_event(event)
}

fn turn(session: &Session, content: &str) -> NewEvent {
    NewEvent::new(&session.id, EventType::Turn, content)
}

// ── S1: user correction becomes a constraint ─────────────────────────────

#[test]
fn correction_turn_yields_a_constraint() {
    let (store, curator, session) = setup();

    for content in [
        "[user]: Add a login page",
        "[user]: The header looks off on mobile",
        "[user]: Wire the form to the api",
        "[user]: Looks good so far",
        "[user]: Don't use any type, always use specific types",
    ] {
        ingest(&store, &curator, &session, turn(&session, content));
    }

    let outcome = curator
        .execute(&store, &session, CheckpointTrigger::Manual, None, Deadline::none())
        .unwrap();

    assert_eq!(outcome.episode_event_count, 5);
    assert!(outcome.memories_created >= 1);
    assert_eq!(curator.buffered(&session.id), 0);

    let constraints = store
        .list_objects(&ObjectFilter::active(ObjectType::Constraint))
        .unwrap();
    assert!(constraints.iter().any(|c| c.content.contains("any type")));

    // Provenance points back at the journal.
    let constraint = constraints
        .iter()
        .find(|c| c.content.contains("any type"))
        .unwrap();
    assert!(!constraint.evidence_event_ids.is_empty());
    assert!(constraint.evidence_excerpt.is_some());
}

// ── S2: tool burst fires on the 10th rapid output ────────────────────────

#[test]
fn rapid_tool_outputs_trigger_a_burst() {
    let (store, curator, session) = setup();
    let start = Utc::now();

    let mut triggers = Vec::new();
    for i in 0..11 {
        let mut event = NewEvent::new(
            &session.id,
            EventType::ToolOutput,
            format!("ran build step {i}"),
        );
        event.tool_name = Some("bash".to_string());
        event.exit_code = Some(0);
        event.timestamp = Some(start + Duration::seconds(i));
        triggers.push(ingest(&store, &curator, &session, event));
    }

    assert_eq!(triggers[9], Some(CheckpointTrigger::ToolBurst));
    assert!(triggers[..9].iter().all(|t| t.is_none()));
}

// ── Task completion: green after red ─────────────────────────────────────

#[test]
fn clean_exit_after_failure_signals_task_complete() {
    let (store, curator, session) = setup();

    for i in 0..9 {
        ingest(&store, &curator, &session, turn(&session, &format!("note {i}")));
    }

    let mut fail = NewEvent::new(&session.id, EventType::ToolOutput, "test FAILED: 1 failed");
    fail.exit_code = Some(1);
    fail.file_path = Some("src/auth.rs".to_string());
    ingest(&store, &curator, &session, fail);

    let mut pass = NewEvent::new(&session.id, EventType::ToolOutput, "test ok: 12 passed");
    pass.exit_code = Some(0);
    pass.file_path = Some("src/auth.rs".to_string());
    let trigger = ingest(&store, &curator, &session, pass);

    assert_eq!(trigger, Some(CheckpointTrigger::TaskComplete));

    // The checkpoint turns the red-green pair into a decision.
    let outcome = curator
        .execute(&store, &session, CheckpointTrigger::TaskComplete, None, Deadline::none())
        .unwrap();
    assert!(outcome.memories_created >= 1);

    let decisions = store
        .list_objects(&ObjectFilter::active(ObjectType::Decision))
        .unwrap();
    assert!(decisions.iter().any(|d| d.content.contains("src/auth.rs")));
}

// ── Error burst ──────────────────────────────────────────────────────────

#[test]
fn consecutive_failures_trigger_error_burst() {
    let (store, curator, session) = setup();

    for i in 0..8 {
        ingest(&store, &curator, &session, turn(&session, &format!("context {i}")));
    }

    let mut last = None;
    for i in 0..3 {
        let mut fail = NewEvent::new(
            &session.id,
            EventType::ToolOutput,
            format!("compile error attempt {i}"),
        );
        fail.exit_code = Some(101);
        last = ingest(&store, &curator, &session, fail);
    }
    assert_eq!(last, Some(CheckpointTrigger::ErrorBurst));
}

// ── Dedup across checkpoints ─────────────────────────────────────────────

#[test]
fn identical_candidate_content_is_deduplicated() {
    let (store, curator, session) = setup();
    let correction = "[user]: Never log credentials";

    ingest(&store, &curator, &session, turn(&session, correction));
    let first = curator
        .execute(&store, &session, CheckpointTrigger::Manual, None, Deadline::none())
        .unwrap();
    assert_eq!(first.memories_created, 1);

    // Same correction in a fresh session dedups by content hash.
    let other = store.create_session("/work/project").unwrap();
    ingest(&store, &curator, &other, turn(&other, correction));
    let second = curator
        .execute(&store, &other, CheckpointTrigger::Manual, None, Deadline::none())
        .unwrap();
    assert_eq!(second.memories_created, 0);
}

// ── Conflict gating ──────────────────────────────────────────────────────

#[test]
fn evidenced_candidate_supersedes_weaker_conflicting_memory() {
    let (store, curator, session) = setup();

    let existing = store
        .create_object(ObjectDraft::new(
            ObjectType::Decision,
            "Use React for the frontend",
        ))
        .unwrap();

    ingest(
        &store,
        &curator,
        &session,
        turn(&session, "[user]: No, use Vue for the frontend"),
    );
    let outcome = curator
        .execute(&store, &session, CheckpointTrigger::Manual, None, Deadline::none())
        .unwrap();
    assert_eq!(outcome.memories_created, 1);

    // The hypothesis-tier memory lost to the evidence-backed candidate.
    let old = store.get_object(&existing.id).unwrap().unwrap();
    assert_eq!(old.status, ObjectStatus::Superseded);
    let new = store.get_object(old.superseded_by.as_deref().unwrap()).unwrap().unwrap();
    assert!(new.content.contains("Vue"));
    assert!(new.supersedes.contains(&existing.id));
}

// ── Manual runs ignore the minimum buffer ────────────────────────────────

#[test]
fn manual_checkpoint_runs_on_a_small_buffer() {
    let (store, curator, session) = setup();
    ingest(&store, &curator, &session, turn(&session, "[user]: Don't commit secrets"));

    let outcome = curator
        .execute(&store, &session, CheckpointTrigger::Manual, None, Deadline::none())
        .unwrap();
    assert_eq!(outcome.episode_event_count, 1);
    assert_eq!(outcome.memories_created, 1);
}

#[test]
fn empty_buffer_checkpoint_is_a_clean_noop() {
    let (store, curator, session) = setup();
    let outcome = curator
        .execute(&store, &session, CheckpointTrigger::Manual, None, Deadline::none())
        .unwrap();
    assert_eq!(outcome.episode_event_count, 0);
    assert_eq!(outcome.memories_created, 0);
}
