//! Aggregate counts and sizes.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use engram_core::errors::EngramResult;

use crate::to_storage_err;

/// Store-wide counters reported by `stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub events: u64,
    pub blobs: u64,
    pub objects_total: u64,
    pub objects_active: u64,
    pub objects_superseded: u64,
    pub objects_retired: u64,
    pub sessions: u64,
    pub vectors: u64,
    pub tokens: u64,
    /// Database file size in bytes (0 for in-memory stores).
    pub db_bytes: u64,
}

/// Collect all counters in one pass.
pub fn collect(conn: &Connection, db_bytes: u64) -> EngramResult<StoreStats> {
    let count = |sql: &str| -> EngramResult<u64> {
        conn.query_row(sql, [], |row| row.get::<_, i64>(0))
            .map(|n| n as u64)
            .map_err(|e| to_storage_err(e.to_string()))
    };

    Ok(StoreStats {
        events: count("SELECT COUNT(*) FROM events")?,
        blobs: count("SELECT COUNT(*) FROM blobs")?,
        objects_total: count("SELECT COUNT(*) FROM memory_objects")?,
        objects_active: count("SELECT COUNT(*) FROM memory_objects WHERE status = 'active'")?,
        objects_superseded: count(
            "SELECT COUNT(*) FROM memory_objects WHERE status = 'superseded'",
        )?,
        objects_retired: count("SELECT COUNT(*) FROM memory_objects WHERE status = 'retired'")?,
        sessions: count("SELECT COUNT(*) FROM sessions")?,
        vectors: count("SELECT COUNT(*) FROM vectors")?,
        tokens: count("SELECT COUNT(*) FROM object_tokens")?,
        db_bytes,
    })
}

/// Reclaim free pages.
pub fn vacuum(conn: &Connection) -> EngramResult<()> {
    conn.execute_batch("VACUUM")
        .map_err(|e| to_storage_err(e.to_string()))
}
