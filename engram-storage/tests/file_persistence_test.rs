//! File-backed behavior: reopen survival and reader/writer separation.

use engram_core::config::EngramConfig;
use engram_core::event::{EventType, NewEvent};
use engram_core::memory::{ObjectDraft, ObjectType};
use engram_storage::MemoryStore;

#[test]
fn data_survives_a_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("engram.db");

    let object_id;
    let session_id;
    {
        let store = MemoryStore::open(&db_path, EngramConfig::default()).unwrap();
        let session = store.create_session("/work/project").unwrap();
        session_id = session.id.clone();
        store
            .append_event(NewEvent::new(&session.id, EventType::Turn, "hello persistence"))
            .unwrap();
        let object = store
            .create_object(ObjectDraft::new(ObjectType::Fact, "the db file outlives the process"))
            .unwrap();
        object_id = object.id;
    }

    // Second open runs migrations idempotently and sees everything.
    let store = MemoryStore::open(&db_path, EngramConfig::default()).unwrap();
    assert!(store.get_session(&session_id).unwrap().is_some());
    assert!(store.get_object(&object_id).unwrap().is_some());

    let hits = store.search_objects_fts("outlives", 10).unwrap();
    assert_eq!(hits.len(), 1);

    let stats = store.stats().unwrap();
    assert!(stats.db_bytes > 0);
}

#[test]
fn reads_see_committed_writes_through_the_read_connection() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("engram.db");
    let store = MemoryStore::open(&db_path, EngramConfig::default()).unwrap();

    let object = store
        .create_object(ObjectDraft::new(ObjectType::Convention, "wal mode visibility"))
        .unwrap();

    // get_object routes through the reader connection in file-backed mode.
    let fetched = store.get_object(&object.id).unwrap().unwrap();
    assert_eq!(fetched.content, "wal mode visibility");
}
