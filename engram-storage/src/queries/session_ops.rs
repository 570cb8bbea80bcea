//! Session rows and the heatmap query.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use engram_core::errors::EngramResult;
use engram_core::memory::MemoryObject;
use engram_core::session::{DisclosureLevel, Session};

use super::object_crud::{row_to_object, OBJECT_COLUMNS};
use crate::to_storage_err;

/// Insert a fresh session row.
pub fn insert_session(conn: &Connection, session: &Session) -> EngramResult<()> {
    let injected_json = serde_json::to_string(&session.injected_memory_ids)
        .map_err(|e| to_storage_err(e.to_string()))?;
    conn.execute(
        "INSERT INTO sessions (
            id, started_at, ended_at, working_directory, events_count,
            objects_created, events_since_checkpoint, error_count,
            injected_memory_ids, disclosure_level, last_topic,
            last_disclosure_at, events_at_last_disclosure, last_checkpoint_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, NULL)",
        params![
            session.id,
            session.started_at.to_rfc3339(),
            session.ended_at.map(|t| t.to_rfc3339()),
            session.working_directory,
            session.events_count as i64,
            session.objects_created as i64,
            session.events_since_checkpoint as i64,
            session.error_count as i64,
            injected_json,
            session.disclosure_level.as_str(),
            session.last_topic,
            session.last_disclosure_at.map(|t| t.to_rfc3339()),
            session.events_at_last_disclosure as i64,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Rewrite a session row from its in-memory state.
pub fn update_session(conn: &Connection, session: &Session) -> EngramResult<()> {
    let injected_json = serde_json::to_string(&session.injected_memory_ids)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = conn
        .execute(
            "UPDATE sessions SET
                ended_at = ?2, working_directory = ?3, events_count = ?4,
                objects_created = ?5, events_since_checkpoint = ?6, error_count = ?7,
                injected_memory_ids = ?8, disclosure_level = ?9, last_topic = ?10,
                last_disclosure_at = ?11, events_at_last_disclosure = ?12
             WHERE id = ?1",
            params![
                session.id,
                session.ended_at.map(|t| t.to_rfc3339()),
                session.working_directory,
                session.events_count as i64,
                session.objects_created as i64,
                session.events_since_checkpoint as i64,
                session.error_count as i64,
                injected_json,
                session.disclosure_level.as_str(),
                session.last_topic,
                session.last_disclosure_at.map(|t| t.to_rfc3339()),
                session.events_at_last_disclosure as i64,
            ],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    if rows == 0 {
        return Err(engram_core::EngramError::NotFound(session.id.clone()));
    }
    Ok(())
}

/// Get a session row.
pub fn get_session(conn: &Connection, id: &str) -> EngramResult<Option<Session>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, started_at, ended_at, working_directory, events_count,
                    objects_created, events_since_checkpoint, error_count,
                    injected_memory_ids, disclosure_level, last_topic,
                    last_disclosure_at, events_at_last_disclosure
             FROM sessions WHERE id = ?1",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let result = stmt
        .query_row(params![id], |row| Ok(row_to_session(row)))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    match result {
        Some(session) => Ok(Some(session?)),
        None => Ok(None),
    }
}

/// Stamp the checkpoint high-water mark.
pub fn mark_checkpoint(conn: &Connection, session_id: &str, at: DateTime<Utc>) -> EngramResult<()> {
    conn.execute(
        "UPDATE sessions SET last_checkpoint_at = ?2, events_since_checkpoint = 0 WHERE id = ?1",
        params![session_id, at.to_rfc3339()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// The checkpoint high-water mark, if any checkpoint ever ran.
pub fn last_checkpoint_at(
    conn: &Connection,
    session_id: &str,
) -> EngramResult<Option<DateTime<Utc>>> {
    let result: Option<Option<String>> = conn
        .query_row(
            "SELECT last_checkpoint_at FROM sessions WHERE id = ?1",
            params![session_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    match result.flatten() {
        Some(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| to_storage_err(format!("parse checkpoint time '{s}': {e}"))),
        None => Ok(None),
    }
}

/// Heatmap: most-accessed active objects touched within the window,
/// `last_accessed` as tiebreak, capped to `limit`.
pub fn heatmap(
    conn: &Connection,
    window: Duration,
    limit: usize,
    now: DateTime<Utc>,
) -> EngramResult<Vec<MemoryObject>> {
    let cutoff = (now - window).to_rfc3339();
    let sql = format!(
        "SELECT {OBJECT_COLUMNS} FROM memory_objects
         WHERE status = 'active'
           AND access_count > 0
           AND last_accessed IS NOT NULL
           AND last_accessed >= ?1
         ORDER BY access_count DESC, last_accessed DESC
         LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql).map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![cutoff, limit as i64], |row| Ok(row_to_object(row)))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut objects = Vec::new();
    for row in rows {
        objects.push(row.map_err(|e| to_storage_err(e.to_string()))??);
    }
    Ok(objects)
}

fn row_to_session(row: &rusqlite::Row<'_>) -> EngramResult<Session> {
    let injected_json: String = row.get(8).map_err(|e| to_storage_err(e.to_string()))?;
    let level_str: String = row.get(9).map_err(|e| to_storage_err(e.to_string()))?;

    Ok(Session {
        id: row.get(0).map_err(|e| to_storage_err(e.to_string()))?,
        started_at: super::object_crud::get_datetime(row, 1)?,
        ended_at: super::object_crud::get_opt_datetime(row, 2)?,
        working_directory: row.get(3).map_err(|e| to_storage_err(e.to_string()))?,
        events_count: row.get::<_, i64>(4).map_err(|e| to_storage_err(e.to_string()))? as u64,
        objects_created: row.get::<_, i64>(5).map_err(|e| to_storage_err(e.to_string()))? as u64,
        events_since_checkpoint: row
            .get::<_, i64>(6)
            .map_err(|e| to_storage_err(e.to_string()))? as u64,
        error_count: row.get::<_, i64>(7).map_err(|e| to_storage_err(e.to_string()))? as u64,
        injected_memory_ids: serde_json::from_str(&injected_json)
            .map_err(|e| to_storage_err(format!("parse injected ids: {e}")))?,
        disclosure_level: DisclosureLevel::parse_name(&level_str)
            .ok_or_else(|| to_storage_err(format!("unknown disclosure level '{level_str}'")))?,
        last_topic: row.get(10).map_err(|e| to_storage_err(e.to_string()))?,
        last_disclosure_at: super::object_crud::get_opt_datetime(row, 11)?,
        events_at_last_disclosure: row
            .get::<_, i64>(12)
            .map_err(|e| to_storage_err(e.to_string()))? as u64,
    })
}
