//! Retriever: branch fan-out, fusion, effective scoring, reinforcement.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, warn};

use engram_core::constants::{
    BRANCH_TIMEOUT_MS, LEXICAL_BRANCH_CAP, LEXICAL_WEIGHT, PRIORITY_BOOST, TOKEN_BRANCH_CAP,
    TOKEN_WEIGHT, VECTOR_BRANCH_CAP, VECTOR_WEIGHT,
};
use engram_core::deadline::Deadline;
use engram_core::errors::{EngramError, EngramResult};
use engram_core::memory::{MemoryObject, ObjectType};
use engram_core::traits::IEmbedder;
use engram_decay::DecayEngine;
use engram_storage::MemoryStore;

use crate::fusion::{fuse, BranchOutput};

/// Options for a retrieval call.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub limit: usize,
    /// Skip the reinforcement write-back (pack assembly must set this).
    pub skip_reinforcement: bool,
    /// Session-hot ids that receive a fixed additive boost.
    pub priority_ids: Vec<String>,
    /// Restrict results to one object type.
    pub object_type: Option<ObjectType>,
    /// Cooperative cancellation, checked between branches.
    pub deadline: Deadline,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            skip_reinforcement: false,
            priority_ids: Vec::new(),
            object_type: None,
            deadline: Deadline::none(),
        }
    }
}

/// The hybrid retriever over one store.
pub struct Retriever<'a> {
    store: &'a MemoryStore,
    embedder: Option<&'a dyn IEmbedder>,
    decay: DecayEngine,
}

impl<'a> Retriever<'a> {
    pub fn new(store: &'a MemoryStore, embedder: Option<&'a dyn IEmbedder>) -> Self {
        Self {
            store,
            embedder,
            decay: DecayEngine::default(),
        }
    }

    pub fn with_decay(mut self, decay: DecayEngine) -> Self {
        self.decay = decay;
        self
    }

    /// Run the full pipeline: branches → fusion → effective score →
    /// priority boost → (optional) diversification → truncate → reinforce.
    pub fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> EngramResult<Vec<(MemoryObject, f64)>> {
        if query.trim().is_empty() {
            return Err(EngramError::InvalidInput("empty query".into()));
        }

        let branches = self.run_branches(query, &options.deadline)?;
        let fused = fuse(&branches);
        if fused.is_empty() {
            return Ok(Vec::new());
        }

        // Fetch candidates and compose the effective score.
        let ids: Vec<String> = fused.iter().map(|(id, _)| id.clone()).collect();
        let objects = self.store.get_objects_bulk(&ids)?;
        let by_id: HashMap<&str, &MemoryObject> =
            objects.iter().map(|o| (o.id.as_str(), o)).collect();

        let now = Utc::now();
        let mut scored: Vec<(MemoryObject, f64)> = Vec::with_capacity(fused.len());
        for (id, combined) in &fused {
            let Some(object) = by_id.get(id.as_str()) else {
                continue;
            };
            if let Some(wanted) = options.object_type {
                if object.object_type != wanted {
                    continue;
                }
            }
            let mut score = self.decay.effective_score(*combined, object, now);
            if options.priority_ids.iter().any(|p| p == id) {
                score += PRIORITY_BOOST;
            }
            scored.push(((*object).clone(), score));
        }

        if is_aggregate_query(query) {
            scored = self.diversify_by_session(scored)?;
        } else {
            scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        }
        scored.truncate(options.limit);

        if !options.skip_reinforcement {
            options.deadline.check("reinforcement")?;
            let returned: Vec<String> = scored.iter().map(|(o, _)| o.id.clone()).collect();
            self.store
                .reinforce(&returned, self.store.config().reinforce_boost)?;
        }

        debug!(query, results = scored.len(), "retrieval complete");
        Ok(scored)
    }

    /// Run each branch unless the deadline has already passed. A branch
    /// that cannot run, fails, or overruns its per-branch budget
    /// contributes nothing; fusion renormalizes over the rest.
    fn run_branches(&self, query: &str, deadline: &Deadline) -> EngramResult<Vec<BranchOutput>> {
        let budget = std::time::Duration::from_millis(BRANCH_TIMEOUT_MS);
        let mut branches = Vec::with_capacity(3);

        let run = |name: &'static str,
                       weight: f64,
                       branches: &mut Vec<BranchOutput>,
                       results: EngramResult<Vec<(String, f64)>>,
                       started: std::time::Instant|
         -> EngramResult<()> {
            match results {
                Ok(hits) if started.elapsed() <= budget => {
                    debug!(branch = name, hits = hits.len(), "branch complete");
                    branches.push(BranchOutput::new(name, weight, hits));
                }
                Ok(_) => warn!(branch = name, "branch overran its budget, dropped from fusion"),
                Err(EngramError::Dependency(e)) => {
                    warn!(branch = name, error = %e, "branch dependency failed, dropped from fusion")
                }
                Err(e) => return Err(e),
            }
            Ok(())
        };

        deadline.check("lexical branch")?;
        let started = std::time::Instant::now();
        let lexical = self.store.search_objects_fts(query, LEXICAL_BRANCH_CAP);
        run("lexical", LEXICAL_WEIGHT, &mut branches, lexical, started)?;

        if !deadline.expired() {
            if let Some(embedder) = self.embedder.filter(|e| e.is_available()) {
                let started = std::time::Instant::now();
                let hits = embedder
                    .embed(query)
                    .map_err(|e| EngramError::Dependency(e.to_string()))
                    .and_then(|vector| self.store.search_vector(&vector, VECTOR_BRANCH_CAP));
                run("vector", VECTOR_WEIGHT, &mut branches, hits, started)?;
            }
        }

        if !deadline.expired() {
            let started = std::time::Instant::now();
            let tokens = self.store.search_tokens(query, TOKEN_BRANCH_CAP);
            run("token", TOKEN_WEIGHT, &mut branches, tokens, started)?;
        }

        Ok(branches)
    }

    /// Aggregate queries get one hit per originating session first, then
    /// the tail, so counting questions see breadth before depth.
    fn diversify_by_session(
        &self,
        mut scored: Vec<(MemoryObject, f64)>,
    ) -> EngramResult<Vec<(MemoryObject, f64)>> {
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut session_of: HashMap<String, Option<String>> = HashMap::new();
        for (object, _) in &scored {
            let origin = match object.evidence_event_ids.first() {
                Some(event_id) => self.store.get_event(event_id)?.map(|e| e.session_id),
                None => None,
            };
            session_of.insert(object.id.clone(), origin);
        }

        let mut seen_sessions: Vec<String> = Vec::new();
        let mut head: Vec<(MemoryObject, f64)> = Vec::new();
        let mut tail: Vec<(MemoryObject, f64)> = Vec::new();

        for entry in scored {
            match session_of.get(&entry.0.id).cloned().flatten() {
                Some(session) if seen_sessions.contains(&session) => tail.push(entry),
                Some(session) => {
                    seen_sessions.push(session);
                    head.push(entry);
                }
                None => head.push(entry),
            }
        }

        head.extend(tail);
        Ok(head)
    }
}

/// Whether a query reads as multi-hop or counting, which favors breadth
/// across sessions over raw score order.
fn is_aggregate_query(query: &str) -> bool {
    let q = query.to_lowercase();
    ["how many", "how often", "count", "every time", "each time", "across sessions", "all the times"]
        .iter()
        .any(|cue| q.contains(cue))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_cues_detected() {
        assert!(is_aggregate_query("How many times did the build fail?"));
        assert!(is_aggregate_query("count the deploys"));
        assert!(!is_aggregate_query("what database do we use"));
    }
}
