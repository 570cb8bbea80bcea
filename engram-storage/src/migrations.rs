//! Versioned schema migrations, applied in order at open.

use rusqlite::Connection;

use engram_core::errors::EngramResult;

use crate::to_storage_err;

/// A database migration.
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub up: &'static str,
}

/// Migration definitions, ascending.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema: sessions, events, blobs, memory objects, indices",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Checkpoint high-water mark and heatmap index",
        up: MIGRATION_V2_UP,
    },
];

const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    started_at TEXT NOT NULL,
    ended_at TEXT,
    working_directory TEXT NOT NULL,
    events_count INTEGER NOT NULL DEFAULT 0,
    objects_created INTEGER NOT NULL DEFAULT 0,
    events_since_checkpoint INTEGER NOT NULL DEFAULT 0,
    error_count INTEGER NOT NULL DEFAULT 0,
    injected_memory_ids TEXT NOT NULL DEFAULT '[]',
    disclosure_level TEXT NOT NULL DEFAULT 'minimal',
    last_topic TEXT,
    last_disclosure_at TEXT,
    events_at_last_disclosure INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS blobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    content TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS events (
    id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL REFERENCES sessions(id),
    timestamp TEXT NOT NULL,
    event_type TEXT NOT NULL,
    content TEXT,
    blob_id INTEGER REFERENCES blobs(id),
    synopsis TEXT,
    tool_name TEXT,
    file_path TEXT,
    exit_code INTEGER,
    content_hash TEXT NOT NULL,
    token_count INTEGER
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_events_session_hash
    ON events(session_id, content_hash);
CREATE INDEX IF NOT EXISTS idx_events_session_time
    ON events(session_id, timestamp);

CREATE TABLE IF NOT EXISTS memory_objects (
    id TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    object_type TEXT NOT NULL,
    scope_kind TEXT NOT NULL DEFAULT 'project',
    scope_path TEXT,
    status TEXT NOT NULL DEFAULT 'active',
    confidence TEXT NOT NULL DEFAULT 'medium',
    supersedes TEXT NOT NULL DEFAULT '[]',
    superseded_by TEXT,
    evidence_event_ids TEXT NOT NULL DEFAULT '[]',
    evidence_excerpt TEXT,
    code_refs TEXT NOT NULL DEFAULT '[]',
    review_status TEXT NOT NULL DEFAULT 'pending',
    reviewed_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    last_accessed TEXT,
    access_count INTEGER NOT NULL DEFAULT 0,
    strength REAL NOT NULL DEFAULT 1.0,
    last_reinforced_at TEXT,
    outcome_score REAL NOT NULL DEFAULT 0.5,
    last_verified_at TEXT,
    content_hash TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_objects_status_type
    ON memory_objects(status, object_type);
CREATE INDEX IF NOT EXISTS idx_objects_hash
    ON memory_objects(content_hash);

-- FTS tables are synced by explicit writes, never triggers.
CREATE VIRTUAL TABLE IF NOT EXISTS events_fts USING fts5(
    event_id UNINDEXED,
    content,
    tokenize = 'porter unicode61'
);

CREATE VIRTUAL TABLE IF NOT EXISTS memory_objects_fts USING fts5(
    object_id UNINDEXED,
    content,
    tokenize = 'porter unicode61'
);

CREATE TABLE IF NOT EXISTS object_tokens (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    object_id TEXT NOT NULL REFERENCES memory_objects(id),
    token TEXT NOT NULL,
    type TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_object_tokens_token ON object_tokens(token);
CREATE INDEX IF NOT EXISTS idx_object_tokens_object ON object_tokens(object_id);

CREATE TABLE IF NOT EXISTS vectors (
    object_id TEXT PRIMARY KEY REFERENCES memory_objects(id),
    embedding BLOB NOT NULL,
    dim INTEGER NOT NULL
);

INSERT OR IGNORE INTO schema_version (version, applied_at)
    VALUES (1, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'));
"#;

const MIGRATION_V2_UP: &str = r#"
ALTER TABLE sessions ADD COLUMN last_checkpoint_at TEXT;

CREATE INDEX IF NOT EXISTS idx_objects_heatmap
    ON memory_objects(status, access_count DESC, last_accessed DESC);

INSERT OR IGNORE INTO schema_version (version, applied_at)
    VALUES (2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'));
"#;

/// Current schema version recorded in the database, 0 when fresh.
pub fn current_version(conn: &Connection) -> EngramResult<u32> {
    let exists: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    if !exists {
        return Ok(0);
    }
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

/// Apply every pending migration inside a transaction per step.
pub fn run_migrations(conn: &Connection) -> EngramResult<()> {
    let mut version = current_version(conn)?;

    for migration in MIGRATIONS {
        if migration.version <= version {
            continue;
        }
        tracing::info!(
            version = migration.version,
            description = migration.description,
            "applying migration"
        );
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| to_storage_err(format!("migration begin: {e}")))?;
        tx.execute_batch(migration.up).map_err(|e| {
            to_storage_err(format!("migration v{} failed: {e}", migration.version))
        })?;
        tx.commit()
            .map_err(|e| to_storage_err(format!("migration commit: {e}")))?;
        version = migration.version;
    }

    Ok(())
}
