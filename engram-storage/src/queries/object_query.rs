//! Filtered listings over the object store.

use rusqlite::{params, Connection};

use engram_core::errors::EngramResult;
use engram_core::memory::{MemoryObject, ObjectFilter, ObjectStatus, ObjectType};

use super::object_crud::{row_to_object, OBJECT_COLUMNS};
use crate::to_storage_err;

/// List objects matching a filter, newest first.
pub fn list_objects(conn: &Connection, filter: &ObjectFilter) -> EngramResult<Vec<MemoryObject>> {
    let mut sql = format!("SELECT {OBJECT_COLUMNS} FROM memory_objects WHERE 1=1");
    let mut args: Vec<String> = Vec::new();

    if let Some(object_type) = filter.object_type {
        args.push(object_type.as_str().to_string());
        sql.push_str(&format!(" AND object_type = ?{}", args.len()));
    }
    if let Some(status) = filter.status {
        args.push(status.as_str().to_string());
        sql.push_str(&format!(" AND status = ?{}", args.len()));
    }
    if let Some(scope_kind) = filter.scope_kind {
        args.push(scope_kind.as_str().to_string());
        sql.push_str(&format!(" AND scope_kind = ?{}", args.len()));
    }
    if let Some(review) = filter.review_status {
        args.push(review.as_str().to_string());
        sql.push_str(&format!(" AND review_status = ?{}", args.len()));
    }

    sql.push_str(" ORDER BY created_at DESC");
    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    let mut stmt = conn.prepare(&sql).map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(args.iter()), |row| {
            Ok(row_to_object(row))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut objects = Vec::new();
    for row in rows {
        objects.push(row.map_err(|e| to_storage_err(e.to_string()))??);
    }
    Ok(objects)
}

/// All active objects (for pairwise conflict scans).
pub fn list_active(conn: &Connection) -> EngramResult<Vec<MemoryObject>> {
    list_objects(
        conn,
        &ObjectFilter {
            status: Some(ObjectStatus::Active),
            ..Default::default()
        },
    )
}

/// Active objects of one type, hottest (most accessed) first.
pub fn list_active_by_type_hot_first(
    conn: &Connection,
    object_type: ObjectType,
    limit: usize,
) -> EngramResult<Vec<MemoryObject>> {
    let sql = format!(
        "SELECT {OBJECT_COLUMNS} FROM memory_objects
         WHERE status = 'active' AND object_type = ?1
         ORDER BY access_count DESC, last_accessed DESC, created_at DESC
         LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql).map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![object_type.as_str(), limit as i64], |row| {
            Ok(row_to_object(row))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut objects = Vec::new();
    for row in rows {
        objects.push(row.map_err(|e| to_storage_err(e.to_string()))??);
    }
    Ok(objects)
}

/// Most recently created active objects of one type.
pub fn list_recent_by_type(
    conn: &Connection,
    object_type: ObjectType,
    limit: usize,
) -> EngramResult<Vec<MemoryObject>> {
    list_objects(
        conn,
        &ObjectFilter {
            object_type: Some(object_type),
            status: Some(ObjectStatus::Active),
            limit: Some(limit),
            ..Default::default()
        },
    )
}

/// Fetch many objects by id, preserving input order and skipping misses.
pub fn get_bulk(conn: &Connection, ids: &[String]) -> EngramResult<Vec<MemoryObject>> {
    let mut objects = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(object) = super::object_crud::get_object(conn, id)? {
            objects.push(object);
        }
    }
    Ok(objects)
}
