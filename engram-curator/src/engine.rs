//! Checkpoint execution: drain the buffer, produce candidates, dedup,
//! conflict-gate, write survivors.

use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use engram_core::config::EngramConfig;
use engram_core::deadline::Deadline;
use engram_core::errors::{EngramError, EngramResult};
use engram_core::event::Event;
use engram_core::memory::{
    MemoryObject, ObjectStatus, OutcomeScore, Strength,
};
use engram_core::session::Session;
use engram_core::traits::IExtractor;
use engram_conflict::{conflicts_against, Resolution};
use engram_storage::MemoryStore;

use crate::buffer::{CheckpointTrigger, EventBuffer};
use crate::producers::{registry, Candidate};

/// Cap on candidates taken from the optional higher-tier extractor.
const EXTRACTOR_MAX: usize = 5;

/// Result of one checkpoint pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckpointOutcome {
    pub trigger: Option<String>,
    pub episode_event_count: usize,
    pub candidates_extracted: usize,
    pub memories_created: usize,
    /// Ids of objects written this pass (callers embed these).
    pub created_ids: Vec<String>,
    /// Candidate contents held for user resolution (`ask_user` conflicts).
    pub held_for_review: Vec<String>,
}

/// The curator: per-session buffers plus the checkpoint pipeline.
/// `add_event` and `execute` serialize per session through the map entry.
pub struct Curator {
    buffers: DashMap<String, EventBuffer>,
    config: EngramConfig,
}

impl Curator {
    pub fn new(config: EngramConfig) -> Self {
        Self {
            buffers: DashMap::new(),
            config,
        }
    }

    /// Buffer an event, returning a trigger when an auto-checkpoint is due.
    /// Auto-triggers respect the minimum buffer size; manual runs do not.
    pub fn add_event(&self, event: Event) -> Option<CheckpointTrigger> {
        let mut buffer = self
            .buffers
            .entry(event.session_id.clone())
            .or_insert_with(|| EventBuffer::new(&self.config));
        let trigger = buffer.add_event(event)?;
        buffer.meets_minimum().then_some(trigger)
    }

    /// Buffered event count for a session.
    pub fn buffered(&self, session_id: &str) -> usize {
        self.buffers.get(session_id).map(|b| b.len()).unwrap_or(0)
    }

    /// Drop a session's buffer (session end).
    pub fn forget_session(&self, session_id: &str) {
        self.buffers.remove(session_id);
    }

    /// Execute a checkpoint for a session: drain its buffer and run the
    /// curation pipeline. Manual checkpoints run even on a small or empty
    /// buffer.
    pub fn execute(
        &self,
        store: &MemoryStore,
        session: &Session,
        trigger: CheckpointTrigger,
        extractor: Option<&dyn IExtractor>,
        deadline: Deadline,
    ) -> EngramResult<CheckpointOutcome> {
        let events = match self.buffers.get_mut(session.id.as_str()) {
            Some(mut buffer) => buffer.drain(),
            None => Vec::new(),
        };

        let mut outcome = CheckpointOutcome {
            trigger: Some(trigger.as_str().to_string()),
            episode_event_count: events.len(),
            ..Default::default()
        };
        if events.is_empty() {
            store.mark_checkpoint(&session.id)?;
            return Ok(outcome);
        }

        // Tier-0 producers, in registry order.
        let mut candidates: Vec<Candidate> = Vec::new();
        for (name, producer) in registry() {
            let produced = producer(&events, session);
            debug!(producer = name, count = produced.len(), "tier-0 producer ran");
            candidates.extend(produced);
        }

        // Optional higher tier; failures and deadline expiry degrade to
        // Tier-0 output only.
        if let Some(extractor) = extractor.filter(|e| e.is_available()) {
            if deadline.expired() {
                warn!("extractor skipped: deadline expired, keeping tier-0 output");
            } else {
                match extractor.extract(&events, EXTRACTOR_MAX) {
                    Ok(extra) => {
                        let evidence: Vec<String> =
                            events.iter().take(5).map(|e| e.id.clone()).collect();
                        for c in extra {
                            candidates.push(Candidate {
                                draft: engram_core::memory::ObjectDraft {
                                    content: c.content,
                                    object_type: c.object_type,
                                    confidence: c.confidence,
                                    evidence_event_ids: evidence.clone(),
                                    ..Default::default()
                                },
                                producer: "extractor",
                            });
                        }
                    }
                    Err(e) => warn!(error = %e, "extractor failed, keeping tier-0 output"),
                }
            }
        }

        outcome.candidates_extracted = candidates.len();

        // Gate and write survivors.
        let active = store.list_active()?;
        for candidate in candidates {
            deadline.check("curation")?;
            match self.gate_and_write(store, &active, candidate)? {
                Written::Created(id) | Written::Superseded(id) => {
                    outcome.memories_created += 1;
                    outcome.created_ids.push(id);
                }
                Written::Duplicate => {}
                Written::Held(content) => outcome.held_for_review.push(content),
                Written::Dropped => {}
            }
        }

        store.mark_checkpoint(&session.id)?;
        info!(
            session = %session.id,
            trigger = %trigger,
            events = outcome.episode_event_count,
            candidates = outcome.candidates_extracted,
            created = outcome.memories_created,
            "checkpoint complete"
        );
        Ok(outcome)
    }

    /// Dedup by content hash, then conflict-gate. In non-interactive mode
    /// `keep_grounded` and `keep_newer` apply automatically; `ask_user`
    /// holds the candidate.
    fn gate_and_write(
        &self,
        store: &MemoryStore,
        active: &[MemoryObject],
        candidate: Candidate,
    ) -> EngramResult<Written> {
        if store.find_object_by_content(&candidate.draft.content)?.is_some() {
            debug!(producer = candidate.producer, "candidate deduplicated by hash");
            return Ok(Written::Duplicate);
        }

        let probe = probe_object(&candidate);
        let conflicts = conflicts_against(&probe, active);

        let Some(conflict) = conflicts.first() else {
            let created = store.create_object(candidate.draft)?;
            return Ok(Written::Created(created.id));
        };

        let existing_id = conflict
            .memory_ids
            .iter()
            .find(|id| *id != &probe.id)
            .cloned()
            .unwrap_or_default();

        match conflict.suggested_resolution {
            Resolution::KeepNewer => {
                // The candidate is the newer side by construction.
                let created = store.supersede(&existing_id, candidate.draft)?;
                Ok(Written::Superseded(created.id))
            }
            Resolution::KeepGrounded => {
                let existing_tier = store
                    .get_object(&existing_id)?
                    .map(|o| o.confidence_tier());
                let candidate_tier = probe.confidence_tier();
                match existing_tier {
                    Some(tier) if tier >= candidate_tier => {
                        debug!(existing = %existing_id, "existing memory is better grounded, dropping candidate");
                        Ok(Written::Dropped)
                    }
                    _ => {
                        let created = store.supersede(&existing_id, candidate.draft)?;
                        Ok(Written::Superseded(created.id))
                    }
                }
            }
            Resolution::AskUser => {
                let content = candidate.draft.content.clone();
                debug!(
                    conflict = conflict.kind.as_str(),
                    "candidate held pending user resolution"
                );
                Ok(Written::Held(content))
            }
        }
    }
}

enum Written {
    Created(String),
    Superseded(String),
    Duplicate,
    Held(String),
    Dropped,
}

/// Ephemeral object used to run the conflict detector against a draft
/// that has not been written yet.
fn probe_object(candidate: &Candidate) -> MemoryObject {
    let now = Utc::now();
    MemoryObject {
        id: String::from("candidate"),
        content: candidate.draft.content.clone(),
        object_type: candidate.draft.object_type,
        scope: candidate.draft.scope.clone(),
        status: ObjectStatus::Active,
        confidence: candidate.draft.confidence,
        supersedes: Vec::new(),
        superseded_by: None,
        evidence_event_ids: candidate.draft.evidence_event_ids.clone(),
        evidence_excerpt: candidate.draft.evidence_excerpt.clone(),
        code_refs: candidate.draft.code_refs.clone(),
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
    }
}

/// Helper for the `PolicyHold` error kind when a caller insists on a
/// definitive answer for a held candidate.
pub fn policy_hold_error(content: &str) -> EngramError {
    EngramError::PolicyHold(format!("candidate pending user resolution: {content}"))
}
