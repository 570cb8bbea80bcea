//! Append-only event journal operations.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use engram_core::errors::EngramResult;
use engram_core::event::{Event, EventType};

use crate::to_storage_err;

/// Insert an event row plus its FTS row. The caller has already resolved
/// id, timestamp, hash, and the blob decision. Content lands either inline
/// or in the blob table, never both.
pub fn insert_event(
    conn: &Connection,
    event: &Event,
    blob_content: Option<&str>,
) -> EngramResult<()> {
    let blob_id = match blob_content {
        Some(content) => {
            conn.execute("INSERT INTO blobs (content) VALUES (?1)", params![content])
                .map_err(|e| to_storage_err(e.to_string()))?;
            Some(conn.last_insert_rowid())
        }
        None => None,
    };

    let inline: Option<&str> = if blob_id.is_some() {
        None
    } else {
        Some(event.content.as_str())
    };

    conn.execute(
        "INSERT INTO events (
            id, session_id, timestamp, event_type, content, blob_id, synopsis,
            tool_name, file_path, exit_code, content_hash, token_count
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            event.id,
            event.session_id,
            event.timestamp.to_rfc3339(),
            event.event_type.as_str(),
            inline,
            blob_id,
            event.synopsis,
            event.tool_name,
            event.file_path,
            event.exit_code,
            event.content_hash,
            event.token_count,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    // FTS row in the same transaction; the full content is always indexed.
    conn.execute(
        "INSERT INTO events_fts (event_id, content) VALUES (?1, ?2)",
        params![event.id, event.content],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    Ok(())
}

/// Find an event id by its session-scoped content hash (dedup check).
pub fn find_by_hash(
    conn: &Connection,
    session_id: &str,
    content_hash: &str,
) -> EngramResult<Option<String>> {
    conn.query_row(
        "SELECT id FROM events WHERE session_id = ?1 AND content_hash = ?2",
        params![session_id, content_hash],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| to_storage_err(e.to_string()))
}

/// Get a single event, reconstructing blobbed content.
pub fn get_event(conn: &Connection, id: &str) -> EngramResult<Option<Event>> {
    let mut stmt = conn
        .prepare(
            "SELECT e.id, e.session_id, e.timestamp, e.event_type,
                    COALESCE(e.content, b.content, ''), e.blob_id, e.synopsis,
                    e.tool_name, e.file_path, e.exit_code, e.content_hash, e.token_count
             FROM events e
             LEFT JOIN blobs b ON b.id = e.blob_id
             WHERE e.id = ?1",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let result = stmt
        .query_row(params![id], |row| Ok(row_to_event(row)))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    match result {
        Some(event) => Ok(Some(event?)),
        None => Ok(None),
    }
}

/// List a session's events in append order, optionally bounded below.
pub fn list_events(
    conn: &Connection,
    session_id: &str,
    since: Option<DateTime<Utc>>,
    limit: usize,
) -> EngramResult<Vec<Event>> {
    let since_str = since.map(|t| t.to_rfc3339()).unwrap_or_default();
    let mut stmt = conn
        .prepare(
            "SELECT e.id, e.session_id, e.timestamp, e.event_type,
                    COALESCE(e.content, b.content, ''), e.blob_id, e.synopsis,
                    e.tool_name, e.file_path, e.exit_code, e.content_hash, e.token_count
             FROM events e
             LEFT JOIN blobs b ON b.id = e.blob_id
             WHERE e.session_id = ?1 AND (?2 = '' OR e.timestamp > ?2)
             ORDER BY e.timestamp ASC
             LIMIT ?3",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map(params![session_id, since_str, limit as i64], |row| {
            Ok(row_to_event(row))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut events = Vec::new();
    for row in rows {
        events.push(row.map_err(|e| to_storage_err(e.to_string()))??);
    }
    Ok(events)
}

/// Count events in a session.
pub fn count_for_session(conn: &Connection, session_id: &str) -> EngramResult<u64> {
    conn.query_row(
        "SELECT COUNT(*) FROM events WHERE session_id = ?1",
        params![session_id],
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n as u64)
    .map_err(|e| to_storage_err(e.to_string()))
}

/// Whether every id in `ids` references an existing event.
pub fn all_exist(conn: &Connection, ids: &[String]) -> EngramResult<bool> {
    for id in ids {
        let found: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM events WHERE id = ?1)",
                params![id],
                |row| row.get(0),
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
        if !found {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Parse an event row (column order fixed by the SELECTs above).
fn row_to_event(row: &rusqlite::Row<'_>) -> EngramResult<Event> {
    let timestamp_str: String = row.get(2).map_err(|e| to_storage_err(e.to_string()))?;
    let event_type_str: String = row.get(3).map_err(|e| to_storage_err(e.to_string()))?;

    let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| to_storage_err(format!("parse timestamp '{timestamp_str}': {e}")))?;

    Ok(Event {
        id: row.get(0).map_err(|e| to_storage_err(e.to_string()))?,
        session_id: row.get(1).map_err(|e| to_storage_err(e.to_string()))?,
        timestamp,
        event_type: EventType::parse_name(&event_type_str),
        content: row.get(4).map_err(|e| to_storage_err(e.to_string()))?,
        blob_id: row.get(5).map_err(|e| to_storage_err(e.to_string()))?,
        synopsis: row.get(6).map_err(|e| to_storage_err(e.to_string()))?,
        tool_name: row.get(7).map_err(|e| to_storage_err(e.to_string()))?,
        file_path: row.get(8).map_err(|e| to_storage_err(e.to_string()))?,
        exit_code: row.get(9).map_err(|e| to_storage_err(e.to_string()))?,
        content_hash: row.get(10).map_err(|e| to_storage_err(e.to_string()))?,
        token_count: row.get(11).map_err(|e| to_storage_err(e.to_string()))?,
    })
}
