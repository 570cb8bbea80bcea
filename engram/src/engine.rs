//! The Engram engine: wires the store, curator, retriever, and session
//! machinery behind the public operation surface.

use serde::{Deserialize, Serialize};
use std::path::Path;

use tracing::warn;

use engram_core::config::EngramConfig;
use engram_core::deadline::Deadline;
use engram_core::errors::{EngramError, EngramResult};
use engram_core::event::{Event, NewEvent};
use engram_core::memory::{MemoryObject, ObjectDraft, ObjectFilter, ObjectPatch};
use engram_core::session::Session;
use engram_core::traits::{IEmbedder, IExtractor};
use engram_conflict::{find_conflicts, Conflict};
use engram_curator::{CheckpointOutcome, CheckpointTrigger, Curator};
use engram_retrieval::{Retriever, SearchOptions};
use engram_session::{
    build_pack, check_disclosure, DisclosureCheck, Pack, PackRequest, SessionManager,
};
use engram_storage::{MemoryStore, StoreStats};

/// Database filename under a memory root.
pub(crate) const DB_FILE: &str = "engram.db";

/// Result of one ingest call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub event_id: String,
    /// Present when the append fired an auto-checkpoint.
    pub checkpoint: Option<CheckpointOutcome>,
}

/// Engine-wide statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStats {
    #[serde(flatten)]
    pub store: StoreStats,
    pub open_sessions: usize,
}

/// The memory engine for one root. One writer per root; share via
/// [`crate::registry`] or clone-free references.
pub struct Engram {
    store: MemoryStore,
    curator: Curator,
    sessions: SessionManager,
    config: EngramConfig,
    embedder: Option<Box<dyn IEmbedder>>,
    extractor: Option<Box<dyn IExtractor>>,
}

impl Engram {
    /// Open the engine over `<root>/engram.db`.
    pub fn open(root: &Path, config: EngramConfig) -> EngramResult<Self> {
        let store = MemoryStore::open(&root.join(DB_FILE), config.clone())?;
        Ok(Self::assemble(store, config))
    }

    /// Open a fresh in-memory engine (tests, ephemeral use).
    pub fn open_in_memory(config: EngramConfig) -> EngramResult<Self> {
        let store = MemoryStore::open_in_memory(config.clone())?;
        Ok(Self::assemble(store, config))
    }

    fn assemble(store: MemoryStore, config: EngramConfig) -> Self {
        Self {
            store,
            curator: Curator::new(config.clone()),
            sessions: SessionManager::new(),
            config,
            embedder: None,
            extractor: None,
        }
    }

    /// Attach an embedding provider (enables the vector branch).
    pub fn with_embedder(mut self, embedder: Box<dyn IEmbedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Attach a higher-tier candidate extractor.
    pub fn with_extractor(mut self, extractor: Box<dyn IExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn config(&self) -> &EngramConfig {
        &self.config
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    fn embedder_ref(&self) -> Option<&dyn IEmbedder> {
        self.embedder.as_deref()
    }

    // ── Sessions ───────────────────────────────────────────────────────

    pub fn session_start(&self, working_directory: &str) -> EngramResult<Session> {
        self.sessions.start(&self.store, working_directory)
    }

    pub fn session_end(&self, session_id: &str) -> EngramResult<Session> {
        self.curator.forget_session(session_id);
        self.sessions.end(&self.store, session_id)
    }

    pub fn session(&self, session_id: &str) -> EngramResult<Session> {
        self.sessions.refresh(&self.store, session_id)
    }

    // ── Ingestion ──────────────────────────────────────────────────────

    /// Append an event, buffer it for curation, and run any auto-triggered
    /// checkpoint.
    pub fn ingest(&self, new: NewEvent) -> EngramResult<IngestReceipt> {
        let event = self.store.append_event(new)?;
        let trigger = self.curator.add_event(event.clone());

        let checkpoint = match trigger {
            Some(trigger) => Some(self.run_checkpoint(&event.session_id, trigger)?),
            None => None,
        };

        Ok(IngestReceipt {
            event_id: event.id,
            checkpoint,
        })
    }

    pub fn get_event(&self, id: &str) -> EngramResult<Event> {
        self.store
            .get_event(id)?
            .ok_or_else(|| EngramError::NotFound(format!("event {id}")))
    }

    // ── Checkpoints ────────────────────────────────────────────────────

    /// Manual checkpoint; runs regardless of buffer size.
    pub fn checkpoint(&self, session_id: &str, _reason: &str) -> EngramResult<CheckpointOutcome> {
        self.run_checkpoint(session_id, CheckpointTrigger::Manual)
    }

    fn run_checkpoint(
        &self,
        session_id: &str,
        trigger: CheckpointTrigger,
    ) -> EngramResult<CheckpointOutcome> {
        let session = self.sessions.refresh(&self.store, session_id)?;
        let outcome = self.curator.execute(
            &self.store,
            &session,
            trigger,
            self.extractor.as_deref(),
            Deadline::none(),
        )?;

        // Embed what the curator wrote; embedding failure only degrades.
        if let Some(embedder) = self.embedder_ref() {
            for id in &outcome.created_ids {
                self.embed_object(embedder, id);
            }
        }

        // Track attribution on the session.
        if outcome.memories_created > 0 {
            let mut session = self.sessions.refresh(&self.store, session_id)?;
            session.objects_created += outcome.memories_created as u64;
            self.sessions.save(&self.store, &session)?;
        }

        Ok(outcome)
    }

    fn embed_object(&self, embedder: &dyn IEmbedder, id: &str) {
        let content = match self.store.get_object(id) {
            Ok(Some(object)) => object.content,
            _ => return,
        };
        match embedder.embed(&content) {
            Ok(vector) => {
                if let Err(e) = self.store.store_embedding(id, &vector) {
                    warn!(object = %id, error = %e, "failed to store embedding");
                }
            }
            Err(e) => warn!(object = %id, error = %e, "embedding failed, object stays lexical-only"),
        }
    }

    // ── Retrieval ──────────────────────────────────────────────────────

    pub fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> EngramResult<Vec<(MemoryObject, f64)>> {
        Retriever::new(&self.store, self.embedder_ref()).search(query, options)
    }

    /// Assemble a context pack for a session and record the injection.
    pub fn pack(&self, session_id: Option<&str>, request: &PackRequest) -> EngramResult<Pack> {
        let session = match session_id {
            Some(id) => Some(self.sessions.refresh(&self.store, id)?),
            None => None,
        };
        let pack = build_pack(&self.store, self.embedder_ref(), session.as_ref(), request)?;

        if let Some(session) = &session {
            let ids: Vec<String> = pack.objects.iter().map(|o| o.id.clone()).collect();
            self.sessions.record_disclosure(
                &self.store,
                &session.id,
                &ids,
                request.level,
                request.file.as_deref(),
            )?;
        }
        Ok(pack)
    }

    /// Per-turn escalation signals.
    pub fn disclose_check(
        &self,
        session_id: &str,
        query: Option<&str>,
        file: Option<&str>,
    ) -> EngramResult<DisclosureCheck> {
        let session = self.sessions.refresh(&self.store, session_id)?;
        Ok(check_disclosure(&session, query, file, &self.config))
    }

    // ── Object lifecycle ───────────────────────────────────────────────

    /// Explicitly add a memory object, bypassing curation.
    pub fn add(&self, draft: ObjectDraft) -> EngramResult<MemoryObject> {
        let object = self.store.create_object(draft)?;
        if let Some(embedder) = self.embedder_ref() {
            self.embed_object(embedder, &object.id);
        }
        Ok(object)
    }

    pub fn get(&self, id: &str) -> EngramResult<MemoryObject> {
        self.store
            .get_object(id)?
            .ok_or_else(|| EngramError::NotFound(format!("object {id}")))
    }

    pub fn list(&self, filter: &ObjectFilter) -> EngramResult<Vec<MemoryObject>> {
        self.store.list_objects(filter)
    }

    pub fn update(&self, id: &str, patch: &ObjectPatch) -> EngramResult<MemoryObject> {
        self.store.update_object(id, patch)
    }

    pub fn verify(&self, id: &str) -> EngramResult<MemoryObject> {
        self.store.verify(id)
    }

    pub fn retire(&self, id: &str) -> EngramResult<MemoryObject> {
        self.store.retire(id)
    }

    pub fn supersede(&self, old_id: &str, draft: ObjectDraft) -> EngramResult<MemoryObject> {
        let object = self.store.supersede(old_id, draft)?;
        if let Some(embedder) = self.embedder_ref() {
            self.embed_object(embedder, &object.id);
        }
        Ok(object)
    }

    /// Pairwise conflict scan over all active objects.
    pub fn find_conflicts(&self) -> EngramResult<Vec<Conflict>> {
        Ok(find_conflicts(&self.store.list_active()?))
    }

    // ── Maintenance ────────────────────────────────────────────────────

    pub fn stats(&self) -> EngramResult<EngineStats> {
        Ok(EngineStats {
            store: self.store.stats()?,
            open_sessions: self.sessions.active_count(),
        })
    }

    pub fn vacuum(&self) -> EngramResult<()> {
        self.store.vacuum()
    }
}
