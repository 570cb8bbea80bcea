//! Status transitions, supersession, verification, reinforcement.
//!
//! All functions here expect to run inside a caller-owned transaction.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use engram_core::errors::{EngramError, EngramResult};
use engram_core::memory::{MemoryObject, ObjectStatus, ReviewStatus};

use super::object_crud;
use crate::to_storage_err;

/// Maximum supersession-chain length walked before assuming a cycle.
const MAX_CHAIN: usize = 1000;

/// Walk `superseded_by` links from `start_id` and fail if `forbidden_id`
/// appears or the chain never terminates.
pub fn assert_acyclic(conn: &Connection, start_id: &str, forbidden_id: &str) -> EngramResult<()> {
    let mut current = start_id.to_string();
    for _ in 0..MAX_CHAIN {
        if current == forbidden_id {
            return Err(EngramError::Conflict(format!(
                "supersession cycle through {forbidden_id}"
            )));
        }
        let next: Option<Option<String>> = conn
            .query_row(
                "SELECT superseded_by FROM memory_objects WHERE id = ?1",
                params![current],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                e => Err(to_storage_err(e.to_string())),
            })?;
        match next.flatten() {
            Some(next_id) => current = next_id,
            None => return Ok(()),
        }
    }
    Err(EngramError::Conflict(format!(
        "supersession chain from {start_id} exceeds {MAX_CHAIN} links"
    )))
}

/// Mark `old` superseded by `new_id`. The caller has already inserted the
/// new object and recorded `old.id` in its `supersedes` list.
pub fn mark_superseded(
    conn: &Connection,
    old: &MemoryObject,
    new_id: &str,
    now: DateTime<Utc>,
) -> EngramResult<()> {
    if !old.status.can_transition_to(ObjectStatus::Superseded) {
        return Err(EngramError::Conflict(format!(
            "cannot supersede object {} in status {}",
            old.id, old.status
        )));
    }
    conn.execute(
        "UPDATE memory_objects
         SET status = 'superseded', superseded_by = ?2, updated_at = ?3
         WHERE id = ?1",
        params![old.id, new_id, now.to_rfc3339()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Retire an object. Idempotent: retiring a retired object is a no-op.
pub fn retire(conn: &Connection, id: &str, now: DateTime<Utc>) -> EngramResult<MemoryObject> {
    let object = object_crud::get_object(conn, id)?
        .ok_or_else(|| EngramError::NotFound(id.to_string()))?;

    if object.status == ObjectStatus::Retired {
        return Ok(object);
    }
    if !object.status.can_transition_to(ObjectStatus::Retired) {
        return Err(EngramError::Conflict(format!(
            "cannot retire object {id} in status {}",
            object.status
        )));
    }

    conn.execute(
        "UPDATE memory_objects SET status = 'retired', updated_at = ?2 WHERE id = ?1",
        params![id, now.to_rfc3339()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    object_crud::get_object(conn, id)?.ok_or_else(|| EngramError::NotFound(id.to_string()))
}

/// Record a verification: stamps `last_verified_at` and promotes a pending
/// review to approved.
pub fn verify(conn: &Connection, id: &str, now: DateTime<Utc>) -> EngramResult<MemoryObject> {
    let object = object_crud::get_object(conn, id)?
        .ok_or_else(|| EngramError::NotFound(id.to_string()))?;

    let promote = object.review_status == ReviewStatus::Pending;
    conn.execute(
        "UPDATE memory_objects
         SET last_verified_at = ?2,
             review_status = CASE WHEN ?3 THEN 'approved' ELSE review_status END,
             reviewed_at = CASE WHEN ?3 THEN ?2 ELSE reviewed_at END,
             updated_at = ?2
         WHERE id = ?1",
        params![id, now.to_rfc3339(), promote],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    object_crud::get_object(conn, id)?.ok_or_else(|| EngramError::NotFound(id.to_string()))
}

/// Reinforce a batch of objects in retrieval order: bump access counters
/// and strength, stamp the timestamps.
pub fn reinforce(
    conn: &Connection,
    ids: &[String],
    boost: f64,
    now: DateTime<Utc>,
) -> EngramResult<()> {
    let now_str = now.to_rfc3339();
    for id in ids {
        conn.execute(
            "UPDATE memory_objects
             SET access_count = access_count + 1,
                 last_accessed = ?2,
                 strength = MIN(1.0, strength + ?3),
                 last_reinforced_at = ?2
             WHERE id = ?1",
            params![id, now_str, boost],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}
