//! SessionManager — concurrent per-session runtime state via DashMap,
//! mirrored to the sessions table on every mutation.

use chrono::Utc;
use dashmap::DashMap;

use engram_core::errors::{EngramError, EngramResult};
use engram_core::session::{DisclosureLevel, Session};
use engram_storage::MemoryStore;

/// Thread-safe session manager. The map is a hot cache; the sessions
/// table is the durable copy.
pub struct SessionManager {
    sessions: DashMap<String, Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Start a session rooted at a working directory.
    pub fn start(&self, store: &MemoryStore, working_directory: &str) -> EngramResult<Session> {
        let session = store.create_session(working_directory)?;
        self.sessions.insert(session.id.clone(), session.clone());
        tracing::info!(session = %session.id, dir = %working_directory, "session started");
        Ok(session)
    }

    /// Fetch a session, preferring the hot copy.
    pub fn get(&self, store: &MemoryStore, id: &str) -> EngramResult<Session> {
        if let Some(session) = self.sessions.get(id) {
            return Ok(session.clone());
        }
        let session = store
            .get_session(id)?
            .ok_or_else(|| EngramError::NotFound(format!("session {id}")))?;
        self.sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    /// Re-read a session from the durable copy, refreshing the cache.
    /// Counters move underneath us on every event append.
    pub fn refresh(&self, store: &MemoryStore, id: &str) -> EngramResult<Session> {
        let session = store
            .get_session(id)?
            .ok_or_else(|| EngramError::NotFound(format!("session {id}")))?;
        self.sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    /// Persist a mutated session and refresh the hot copy.
    pub fn save(&self, store: &MemoryStore, session: &Session) -> EngramResult<()> {
        store.update_session(session)?;
        self.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    /// End a session and drop its runtime state.
    pub fn end(&self, store: &MemoryStore, id: &str) -> EngramResult<Session> {
        let session = store.end_session(id)?;
        self.sessions.remove(id);
        tracing::info!(session = %id, "session ended");
        Ok(session)
    }

    /// Record a delivered pack: remember injected ids (deduplicated),
    /// stamp the disclosure state, and track the topic directory.
    pub fn record_disclosure(
        &self,
        store: &MemoryStore,
        session_id: &str,
        injected_ids: &[String],
        level: DisclosureLevel,
        topic_file: Option<&str>,
    ) -> EngramResult<Session> {
        let mut session = self.refresh(store, session_id)?;
        for id in injected_ids {
            if !session.was_injected(id) {
                session.injected_memory_ids.push(id.clone());
            }
        }
        session.disclosure_level = level;
        session.last_disclosure_at = Some(Utc::now());
        session.events_at_last_disclosure = session.events_count;
        if let Some(dir) = topic_file.and_then(parent_dir) {
            session.last_topic = Some(dir);
        }
        self.save(store, &session)?;
        Ok(session)
    }

    /// Number of sessions with runtime state.
    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Directory part of a file path, if any.
pub(crate) fn parent_dir(path: &str) -> Option<String> {
    std::path::Path::new(path)
        .parent()
        .map(|p| p.to_string_lossy().to_string())
        .filter(|p| !p.is_empty())
}
