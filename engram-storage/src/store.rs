//! MemoryStore — the storage engine. Owns the kernel, wraps every
//! multi-table write in one transaction, and keeps the FTS and token
//! indices in step with the rows they mirror.

use std::path::Path;

use chrono::{Duration, Utc};
use uuid::Uuid;

use engram_core::config::EngramConfig;
use engram_core::constants::{HEATMAP_LIMIT, HEATMAP_WINDOW_DAYS};
use engram_core::errors::{EngramError, EngramResult};
use engram_core::event::{Event, NewEvent};
use engram_core::memory::{
    MemoryObject, ObjectDraft, ObjectFilter, ObjectPatch, ObjectStatus, OutcomeScore, Strength,
};
use engram_core::session::Session;
use engram_extract::normalizer;
use engram_extract::tokens::extract_code_tokens;
use engram_tokens::TokenCounter;

use crate::kernel::StorageKernel;
use crate::queries::{
    event_ops, fts, object_crud, object_lifecycle, object_query, session_ops, stats_ops,
    token_ops, vector_ops,
};
use crate::queries::stats_ops::StoreStats;

/// The storage engine for one memory root.
pub struct MemoryStore {
    kernel: StorageKernel,
    config: EngramConfig,
    counter: TokenCounter,
}

impl MemoryStore {
    /// Open (creating if needed) the store backing file.
    pub fn open(path: &Path, config: EngramConfig) -> EngramResult<Self> {
        Ok(Self {
            kernel: StorageKernel::open(path)?,
            config,
            counter: TokenCounter::new(),
        })
    }

    /// Open an in-memory store (tests).
    pub fn open_in_memory(config: EngramConfig) -> EngramResult<Self> {
        Ok(Self {
            kernel: StorageKernel::open_in_memory()?,
            config,
            counter: TokenCounter::new(),
        })
    }

    pub fn config(&self) -> &EngramConfig {
        &self.config
    }

    // ── Events ─────────────────────────────────────────────────────────

    /// Append an event. Assigns id/timestamp, computes the content hash
    /// when missing, spills oversized content to the blob table, and
    /// writes the FTS row — all in one transaction. A duplicate hash in
    /// the same session returns the prior event unchanged.
    pub fn append_event(&self, new: NewEvent) -> EngramResult<Event> {
        if new.session_id.is_empty() {
            return Err(EngramError::InvalidInput("event has no session_id".into()));
        }

        let normalized = normalizer::normalize_event_with_limit(
            &new.content,
            new.event_type,
            new.exit_code,
            self.config.inline_content_limit,
        );
        let content_hash = new
            .content_hash
            .clone()
            .unwrap_or_else(|| normalized.content_hash.clone());
        let token_count = self.counter.count(&new.content) as i64;

        self.kernel.with_tx("append_event", |conn| {
            let session = session_ops::get_session(conn, &new.session_id)?
                .ok_or_else(|| EngramError::InvalidInput(format!(
                    "unknown session {}",
                    new.session_id
                )))?;

            // Session-scoped dedup: same normalized content, same id back.
            if let Some(existing_id) = event_ops::find_by_hash(conn, &session.id, &content_hash)? {
                tracing::debug!(event_id = %existing_id, "duplicate content hash, reusing event");
                return event_ops::get_event(conn, &existing_id)?
                    .ok_or_else(|| EngramError::NotFound(existing_id));
            }

            let event = Event {
                id: Uuid::new_v4().to_string(),
                session_id: session.id.clone(),
                timestamp: new.timestamp.unwrap_or_else(Utc::now),
                event_type: new.event_type,
                content: new.content.clone(),
                blob_id: None,
                synopsis: normalized.synopsis.clone(),
                tool_name: new.tool_name.clone(),
                file_path: new.file_path.clone(),
                exit_code: new.exit_code.or(normalized.signals.exit_code),
                content_hash: content_hash.clone(),
                token_count: Some(token_count),
            };

            let blob_content = normalized.should_blob.then_some(new.content.as_str());
            event_ops::insert_event(conn, &event, blob_content)?;
            session_ops_record_event(conn, &session, &event)?;

            Ok(event)
        })
    }

    pub fn get_event(&self, id: &str) -> EngramResult<Option<Event>> {
        self.kernel.with_reader(|conn| event_ops::get_event(conn, id))
    }

    pub fn list_events(
        &self,
        session_id: &str,
        since: Option<chrono::DateTime<Utc>>,
        limit: usize,
    ) -> EngramResult<Vec<Event>> {
        self.kernel
            .with_reader(|conn| event_ops::list_events(conn, session_id, since, limit))
    }

    /// Events committed after the session's last checkpoint.
    pub fn events_since_checkpoint(&self, session_id: &str) -> EngramResult<Vec<Event>> {
        self.kernel.with_reader(|conn| {
            let since = session_ops::last_checkpoint_at(conn, session_id)?;
            event_ops::list_events(conn, session_id, since, usize::MAX >> 1)
        })
    }

    /// Lexical search over the journal.
    pub fn search_events_fts(&self, query: &str, limit: usize) -> EngramResult<Vec<(String, f64)>> {
        self.kernel.with_reader(|conn| fts::search_events(conn, query, limit))
    }

    // ── Memory objects ─────────────────────────────────────────────────

    /// Create an object from a draft: fills defaults, verifies evidence
    /// events exist, writes row + FTS + token rows in one transaction.
    pub fn create_object(&self, draft: ObjectDraft) -> EngramResult<MemoryObject> {
        if draft.content.trim().is_empty() {
            return Err(EngramError::InvalidInput("object content is empty".into()));
        }

        let now = Utc::now();
        let object = MemoryObject {
            id: Uuid::new_v4().to_string(),
            content: draft.content,
            object_type: draft.object_type,
            scope: draft.scope,
            status: ObjectStatus::Active,
            confidence: draft.confidence,
            supersedes: Vec::new(),
            superseded_by: None,
            evidence_event_ids: draft.evidence_event_ids,
            evidence_excerpt: draft.evidence_excerpt,
            code_refs: draft.code_refs,
            review_status: Default::default(),
            reviewed_at: None,
            created_at: now,
            updated_at: now,
            last_accessed: None,
            access_count: 0,
            strength: Strength::default(),
            last_reinforced_at: None,
            outcome_score: OutcomeScore::default(),
            last_verified_at: None,
        };

        self.kernel.with_tx("create_object", |conn| {
            if !event_ops::all_exist(conn, &object.evidence_event_ids)? {
                return Err(EngramError::InvalidInput(
                    "evidence references an unknown event".into(),
                ));
            }
            insert_indexed(conn, &object)?;
            Ok(object.clone())
        })
    }

    pub fn get_object(&self, id: &str) -> EngramResult<Option<MemoryObject>> {
        self.kernel.with_reader(|conn| object_crud::get_object(conn, id))
    }

    pub fn list_objects(&self, filter: &ObjectFilter) -> EngramResult<Vec<MemoryObject>> {
        self.kernel.with_reader(|conn| object_query::list_objects(conn, filter))
    }

    pub fn list_active(&self) -> EngramResult<Vec<MemoryObject>> {
        self.kernel.with_reader(object_query::list_active)
    }

    pub fn get_objects_bulk(&self, ids: &[String]) -> EngramResult<Vec<MemoryObject>> {
        self.kernel.with_reader(|conn| object_query::get_bulk(conn, ids))
    }

    /// Active objects of one type, hottest first (minimal packs).
    pub fn list_active_by_type_hot_first(
        &self,
        object_type: engram_core::memory::ObjectType,
        limit: usize,
    ) -> EngramResult<Vec<MemoryObject>> {
        self.kernel
            .with_reader(|conn| object_query::list_active_by_type_hot_first(conn, object_type, limit))
    }

    /// Recently created active objects of one type (deep packs).
    pub fn list_recent_by_type(
        &self,
        object_type: engram_core::memory::ObjectType,
        limit: usize,
    ) -> EngramResult<Vec<MemoryObject>> {
        self.kernel
            .with_reader(|conn| object_query::list_recent_by_type(conn, object_type, limit))
    }

    /// Apply a partial update. Content changes re-hash and re-index.
    pub fn update_object(&self, id: &str, patch: &ObjectPatch) -> EngramResult<MemoryObject> {
        self.kernel.with_tx("update_object", |conn| {
            let mut object = object_crud::get_object(conn, id)?
                .ok_or_else(|| EngramError::NotFound(id.to_string()))?;

            let content_changed = patch
                .content
                .as_ref()
                .is_some_and(|c| c != &object.content);

            if let Some(content) = &patch.content {
                object.content = content.clone();
            }
            if let Some(confidence) = patch.confidence {
                object.confidence = confidence;
            }
            if let Some(scope) = &patch.scope {
                object.scope = scope.clone();
            }
            if let Some(outcome) = patch.outcome_score {
                object.outcome_score = OutcomeScore::new(outcome);
            }
            if let Some(review) = patch.review_status {
                object.review_status = review;
                object.reviewed_at = Some(Utc::now());
            }
            if let Some(code_refs) = &patch.code_refs {
                object.code_refs = code_refs.clone();
            }
            if let Some(excerpt) = &patch.evidence_excerpt {
                object.evidence_excerpt = Some(excerpt.clone());
            }
            object.updated_at = Utc::now();

            let hash = normalizer::content_hash(&object.content);
            object_crud::update_object(conn, &object, &hash)?;
            if content_changed {
                fts::deindex_object(conn, &object.id)?;
                fts::index_object(conn, &object.id, &object.content)?;
                token_ops::index_object(conn, &object.id, &extract_code_tokens(&object.content))?;
            }
            Ok(object)
        })
    }

    /// Replace `old_id` with a new object in one transaction: the new row
    /// is created active, the old flips to superseded and points forward.
    pub fn supersede(&self, old_id: &str, draft: ObjectDraft) -> EngramResult<MemoryObject> {
        if draft.content.trim().is_empty() {
            return Err(EngramError::InvalidInput("object content is empty".into()));
        }
        let now = Utc::now();
        let new_id = Uuid::new_v4().to_string();

        self.kernel.with_tx("supersede", |conn| {
            let old = object_crud::get_object(conn, old_id)?
                .ok_or_else(|| EngramError::NotFound(old_id.to_string()))?;

            object_lifecycle::assert_acyclic(conn, old_id, &new_id)?;
            if !event_ops::all_exist(conn, &draft.evidence_event_ids)? {
                return Err(EngramError::InvalidInput(
                    "evidence references an unknown event".into(),
                ));
            }

            let new_object = MemoryObject {
                id: new_id.clone(),
                content: draft.content.clone(),
                object_type: draft.object_type,
                scope: draft.scope.clone(),
                status: ObjectStatus::Active,
                confidence: draft.confidence,
                supersedes: vec![old.id.clone()],
                superseded_by: None,
                evidence_event_ids: draft.evidence_event_ids.clone(),
                evidence_excerpt: draft.evidence_excerpt.clone(),
                code_refs: draft.code_refs.clone(),
                review_status: Default::default(),
                reviewed_at: None,
                created_at: now,
                updated_at: now,
                last_accessed: None,
                access_count: 0,
                strength: Strength::default(),
                last_reinforced_at: None,
                outcome_score: OutcomeScore::default(),
                last_verified_at: None,
            };

            insert_indexed(conn, &new_object)?;
            object_lifecycle::mark_superseded(conn, &old, &new_object.id, now)?;

            tracing::info!(old = %old.id, new = %new_object.id, "superseded memory object");
            Ok(new_object)
        })
    }

    pub fn retire(&self, id: &str) -> EngramResult<MemoryObject> {
        self.kernel
            .with_tx("retire", |conn| object_lifecycle::retire(conn, id, Utc::now()))
    }

    pub fn verify(&self, id: &str) -> EngramResult<MemoryObject> {
        self.kernel
            .with_tx("verify", |conn| object_lifecycle::verify(conn, id, Utc::now()))
    }

    /// Reinforce returned objects in order, one transaction.
    pub fn reinforce(&self, ids: &[String], boost: f64) -> EngramResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.kernel
            .with_tx("reinforce", |conn| object_lifecycle::reinforce(conn, ids, boost, Utc::now()))
    }

    /// Find a non-retired object with the same normalized content.
    pub fn find_object_by_content(&self, content: &str) -> EngramResult<Option<MemoryObject>> {
        let hash = normalizer::content_hash(content);
        self.kernel
            .with_reader(|conn| object_crud::find_by_hash(conn, &hash))
    }

    // ── Index searches ─────────────────────────────────────────────────

    pub fn search_objects_fts(&self, query: &str, limit: usize) -> EngramResult<Vec<(String, f64)>> {
        self.kernel.with_reader(|conn| fts::search_objects(conn, query, limit))
    }

    pub fn search_tokens(&self, query: &str, limit: usize) -> EngramResult<Vec<(String, f64)>> {
        self.kernel.with_reader(|conn| token_ops::search(conn, query, limit))
    }

    pub fn store_embedding(&self, object_id: &str, embedding: &[f32]) -> EngramResult<()> {
        self.kernel
            .with_writer(|conn| vector_ops::store_embedding(conn, object_id, embedding))
    }

    pub fn search_vector(&self, query: &[f32], limit: usize) -> EngramResult<Vec<(String, f64)>> {
        self.kernel.with_reader(|conn| vector_ops::search(conn, query, limit))
    }

    // ── Sessions ───────────────────────────────────────────────────────

    pub fn create_session(&self, working_directory: &str) -> EngramResult<Session> {
        let session = Session::new(Uuid::new_v4().to_string(), working_directory);
        self.kernel.with_tx("create_session", |conn| {
            session_ops::insert_session(conn, &session)?;
            Ok(session.clone())
        })
    }

    pub fn get_session(&self, id: &str) -> EngramResult<Option<Session>> {
        self.kernel.with_reader(|conn| session_ops::get_session(conn, id))
    }

    pub fn update_session(&self, session: &Session) -> EngramResult<()> {
        self.kernel
            .with_tx("update_session", |conn| session_ops::update_session(conn, session))
    }

    pub fn end_session(&self, id: &str) -> EngramResult<Session> {
        self.kernel.with_tx("end_session", |conn| {
            let mut session = session_ops::get_session(conn, id)?
                .ok_or_else(|| EngramError::NotFound(id.to_string()))?;
            if session.ended_at.is_none() {
                session.ended_at = Some(Utc::now());
                session_ops::update_session(conn, &session)?;
            }
            Ok(session)
        })
    }

    pub fn mark_checkpoint(&self, session_id: &str) -> EngramResult<()> {
        self.kernel
            .with_tx("mark_checkpoint", |conn| {
                session_ops::mark_checkpoint(conn, session_id, Utc::now())
            })
    }

    /// Hot memories: most-accessed active objects in the recent window.
    pub fn heatmap(&self, limit: Option<usize>) -> EngramResult<Vec<MemoryObject>> {
        self.kernel.with_reader(|conn| {
            session_ops::heatmap(
                conn,
                Duration::days(HEATMAP_WINDOW_DAYS),
                limit.unwrap_or(HEATMAP_LIMIT),
                Utc::now(),
            )
        })
    }

    // ── Maintenance ────────────────────────────────────────────────────

    pub fn stats(&self) -> EngramResult<StoreStats> {
        let db_bytes = self
            .kernel
            .db_path()
            .and_then(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0);
        self.kernel.with_reader(|conn| stats_ops::collect(conn, db_bytes))
    }

    pub fn vacuum(&self) -> EngramResult<()> {
        self.kernel.with_writer(stats_ops::vacuum)
    }
}

/// Object row + FTS row + token rows, one call site for both create paths.
fn insert_indexed(conn: &rusqlite::Connection, object: &MemoryObject) -> EngramResult<()> {
    let hash = normalizer::content_hash(&object.content);
    object_crud::insert_object(conn, object, &hash)?;
    fts::index_object(conn, &object.id, &object.content)?;
    token_ops::index_object(conn, &object.id, &extract_code_tokens(&object.content))?;
    Ok(())
}

/// Bump session counters for a freshly appended event, inside the same
/// transaction. Error counting is consecutive: a clean exit resets it.
fn session_ops_record_event(
    conn: &rusqlite::Connection,
    session: &Session,
    event: &Event,
) -> EngramResult<()> {
    let mut updated = session.clone();
    updated.events_count += 1;
    updated.events_since_checkpoint += 1;

    let is_error = event.event_type == engram_core::event::EventType::Error
        || event.exit_code.is_some_and(|c| c != 0);
    let is_success = event.exit_code == Some(0);
    if is_error {
        updated.error_count += 1;
    } else if is_success {
        updated.error_count = 0;
    }

    session_ops::update_session(conn, &updated)
}
