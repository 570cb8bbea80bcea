//! Insert, get, and update for memory objects, plus row parsing shared by
//! the query modules.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use engram_core::errors::EngramResult;
use engram_core::memory::{
    CodeRef, ConfidenceLevel, MemoryObject, ObjectStatus, ObjectType, OutcomeScore, ReviewStatus,
    Scope, ScopeKind, Strength,
};

use crate::to_storage_err;

pub(crate) const OBJECT_COLUMNS: &str = "id, content, object_type, scope_kind, scope_path, status, confidence,
     supersedes, superseded_by, evidence_event_ids, evidence_excerpt, code_refs,
     review_status, reviewed_at, created_at, updated_at, last_accessed,
     access_count, strength, last_reinforced_at, outcome_score, last_verified_at";

/// Insert an object row. FTS and token rows are written by the caller in
/// the same transaction.
pub fn insert_object(conn: &Connection, object: &MemoryObject, content_hash: &str) -> EngramResult<()> {
    let supersedes_json = to_json(&object.supersedes)?;
    let evidence_json = to_json(&object.evidence_event_ids)?;
    let code_refs_json = to_json(&object.code_refs)?;

    conn.execute(
        "INSERT INTO memory_objects (
            id, content, object_type, scope_kind, scope_path, status, confidence,
            supersedes, superseded_by, evidence_event_ids, evidence_excerpt, code_refs,
            review_status, reviewed_at, created_at, updated_at, last_accessed,
            access_count, strength, last_reinforced_at, outcome_score, last_verified_at,
            content_hash
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
            ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23
        )",
        params![
            object.id,
            object.content,
            object.object_type.as_str(),
            object.scope.kind.as_str(),
            object.scope.path,
            object.status.as_str(),
            object.confidence.as_str(),
            supersedes_json,
            object.superseded_by,
            evidence_json,
            object.evidence_excerpt,
            code_refs_json,
            object.review_status.as_str(),
            object.reviewed_at.map(|t| t.to_rfc3339()),
            object.created_at.to_rfc3339(),
            object.updated_at.to_rfc3339(),
            object.last_accessed.map(|t| t.to_rfc3339()),
            object.access_count as i64,
            object.strength.value(),
            object.last_reinforced_at.map(|t| t.to_rfc3339()),
            object.outcome_score.value(),
            object.last_verified_at.map(|t| t.to_rfc3339()),
            content_hash,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    Ok(())
}

/// Rewrite an object row in place.
pub fn update_object(conn: &Connection, object: &MemoryObject, content_hash: &str) -> EngramResult<()> {
    let supersedes_json = to_json(&object.supersedes)?;
    let evidence_json = to_json(&object.evidence_event_ids)?;
    let code_refs_json = to_json(&object.code_refs)?;

    let rows = conn
        .execute(
            "UPDATE memory_objects SET
                content = ?2, object_type = ?3, scope_kind = ?4, scope_path = ?5,
                status = ?6, confidence = ?7, supersedes = ?8, superseded_by = ?9,
                evidence_event_ids = ?10, evidence_excerpt = ?11, code_refs = ?12,
                review_status = ?13, reviewed_at = ?14, updated_at = ?15,
                last_accessed = ?16, access_count = ?17, strength = ?18,
                last_reinforced_at = ?19, outcome_score = ?20, last_verified_at = ?21,
                content_hash = ?22
             WHERE id = ?1",
            params![
                object.id,
                object.content,
                object.object_type.as_str(),
                object.scope.kind.as_str(),
                object.scope.path,
                object.status.as_str(),
                object.confidence.as_str(),
                supersedes_json,
                object.superseded_by,
                evidence_json,
                object.evidence_excerpt,
                code_refs_json,
                object.review_status.as_str(),
                object.reviewed_at.map(|t| t.to_rfc3339()),
                object.updated_at.to_rfc3339(),
                object.last_accessed.map(|t| t.to_rfc3339()),
                object.access_count as i64,
                object.strength.value(),
                object.last_reinforced_at.map(|t| t.to_rfc3339()),
                object.outcome_score.value(),
                object.last_verified_at.map(|t| t.to_rfc3339()),
                content_hash,
            ],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    if rows == 0 {
        return Err(engram_core::EngramError::NotFound(object.id.clone()));
    }
    Ok(())
}

/// Get a single object by id.
pub fn get_object(conn: &Connection, id: &str) -> EngramResult<Option<MemoryObject>> {
    let sql = format!("SELECT {OBJECT_COLUMNS} FROM memory_objects WHERE id = ?1");
    let mut stmt = conn.prepare(&sql).map_err(|e| to_storage_err(e.to_string()))?;

    let result = stmt
        .query_row(params![id], |row| Ok(row_to_object(row)))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    match result {
        Some(object) => Ok(Some(object?)),
        None => Ok(None),
    }
}

/// Find an active object carrying the given content hash (curator dedup).
pub fn find_by_hash(conn: &Connection, content_hash: &str) -> EngramResult<Option<MemoryObject>> {
    let sql = format!(
        "SELECT {OBJECT_COLUMNS} FROM memory_objects
         WHERE content_hash = ?1 AND status != 'retired'
         LIMIT 1"
    );
    let mut stmt = conn.prepare(&sql).map_err(|e| to_storage_err(e.to_string()))?;

    let result = stmt
        .query_row(params![content_hash], |row| Ok(row_to_object(row)))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    match result {
        Some(object) => Ok(Some(object?)),
        None => Ok(None),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> EngramResult<String> {
    serde_json::to_string(value).map_err(|e| to_storage_err(e.to_string()))
}

/// Parse an object row (column order is `OBJECT_COLUMNS`).
pub(crate) fn row_to_object(row: &rusqlite::Row<'_>) -> EngramResult<MemoryObject> {
    let object_type_str: String = row.get(2).map_err(|e| to_storage_err(e.to_string()))?;
    let scope_kind_str: String = row.get(3).map_err(|e| to_storage_err(e.to_string()))?;
    let status_str: String = row.get(5).map_err(|e| to_storage_err(e.to_string()))?;
    let confidence_str: String = row.get(6).map_err(|e| to_storage_err(e.to_string()))?;
    let supersedes_json: String = row.get(7).map_err(|e| to_storage_err(e.to_string()))?;
    let evidence_json: String = row.get(9).map_err(|e| to_storage_err(e.to_string()))?;
    let code_refs_json: String = row.get(11).map_err(|e| to_storage_err(e.to_string()))?;
    let review_str: String = row.get(12).map_err(|e| to_storage_err(e.to_string()))?;

    let supersedes: Vec<String> = serde_json::from_str(&supersedes_json)
        .map_err(|e| to_storage_err(format!("parse supersedes: {e}")))?;
    let evidence_event_ids: Vec<String> = serde_json::from_str(&evidence_json)
        .map_err(|e| to_storage_err(format!("parse evidence ids: {e}")))?;
    let code_refs: Vec<CodeRef> = serde_json::from_str(&code_refs_json)
        .map_err(|e| to_storage_err(format!("parse code refs: {e}")))?;

    Ok(MemoryObject {
        id: row.get(0).map_err(|e| to_storage_err(e.to_string()))?,
        content: row.get(1).map_err(|e| to_storage_err(e.to_string()))?,
        object_type: ObjectType::parse_name(&object_type_str)
            .ok_or_else(|| to_storage_err(format!("unknown object type '{object_type_str}'")))?,
        scope: Scope {
            kind: ScopeKind::parse_name(&scope_kind_str)
                .ok_or_else(|| to_storage_err(format!("unknown scope kind '{scope_kind_str}'")))?,
            path: row.get(4).map_err(|e| to_storage_err(e.to_string()))?,
        },
        status: ObjectStatus::parse_name(&status_str)
            .ok_or_else(|| to_storage_err(format!("unknown status '{status_str}'")))?,
        confidence: ConfidenceLevel::parse_name(&confidence_str)
            .ok_or_else(|| to_storage_err(format!("unknown confidence '{confidence_str}'")))?,
        supersedes,
        superseded_by: row.get(8).map_err(|e| to_storage_err(e.to_string()))?,
        evidence_event_ids,
        evidence_excerpt: row.get(10).map_err(|e| to_storage_err(e.to_string()))?,
        code_refs,
        review_status: ReviewStatus::parse_name(&review_str)
            .ok_or_else(|| to_storage_err(format!("unknown review status '{review_str}'")))?,
        reviewed_at: get_opt_datetime(row, 13)?,
        created_at: get_datetime(row, 14)?,
        updated_at: get_datetime(row, 15)?,
        last_accessed: get_opt_datetime(row, 16)?,
        access_count: row
            .get::<_, i64>(17)
            .map_err(|e| to_storage_err(e.to_string()))? as u64,
        strength: Strength::new(row.get(18).map_err(|e| to_storage_err(e.to_string()))?),
        last_reinforced_at: get_opt_datetime(row, 19)?,
        outcome_score: OutcomeScore::new(row.get(20).map_err(|e| to_storage_err(e.to_string()))?),
        last_verified_at: get_opt_datetime(row, 21)?,
    })
}

pub(crate) fn get_datetime(row: &rusqlite::Row<'_>, idx: usize) -> EngramResult<DateTime<Utc>> {
    let s: String = row.get(idx).map_err(|e| to_storage_err(e.to_string()))?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| to_storage_err(format!("parse datetime '{s}': {e}")))
}

pub(crate) fn get_opt_datetime(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> EngramResult<Option<DateTime<Utc>>> {
    let s: Option<String> = row.get(idx).map_err(|e| to_storage_err(e.to_string()))?;
    s.as_deref()
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| to_storage_err(format!("parse datetime '{s}': {e}")))
        })
        .transpose()
}
