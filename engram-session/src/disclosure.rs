//! Progressive disclosure: budgeted context packs and the escalation
//! signals that pick the next level.
//!
//! Pack retrieval never reinforces: injection must not feed the heatmap
//! it reads from.

use serde::{Deserialize, Serialize};
use tracing::debug;

use engram_core::config::EngramConfig;
use engram_core::constants::{
    CONTEXT_WINDOW_TOKENS, DEEP_PACK_BUDGET, MINIMAL_PACK_BUDGET, TASK_PACK_BUDGET,
};
use engram_core::errors::EngramResult;
use engram_core::memory::{MemoryObject, ObjectType};
use engram_core::session::{DisclosureLevel, Session};
use engram_core::traits::IEmbedder;
use engram_retrieval::{Retriever, SearchOptions};
use engram_storage::MemoryStore;
use engram_tokens::TokenCounter;

use crate::manager::parent_dir;

/// Recall cues that signal the user is explicitly asking for memory.
const RECALL_CUES: &[&str] = &[
    "remind me",
    "what did we decide",
    "what did we do",
    "previous session",
    "we discussed",
    "last time",
    "do you remember",
];

/// Events since last disclosure before a topic shift counts.
const TOPIC_SHIFT_MIN_EVENTS: u64 = 5;

/// How many recent decisions a deep pack carries.
const DEEP_RECENT_DECISIONS: usize = 5;

/// Request for a context pack.
#[derive(Debug, Clone, Default)]
pub struct PackRequest {
    pub level: DisclosureLevel,
    pub query: Option<String>,
    pub file: Option<String>,
    pub budget_tokens: Option<usize>,
}

/// A budgeted bundle of memories for the host agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pack {
    pub level: DisclosureLevel,
    pub objects: Vec<MemoryObject>,
    pub tokens_used: usize,
}

/// Assemble a pack. The session (when given) supplies hot ids for
/// prioritization and injected ids for deduplication; the caller records
/// what was actually delivered via `SessionManager::record_disclosure`.
pub fn build_pack(
    store: &MemoryStore,
    embedder: Option<&dyn IEmbedder>,
    session: Option<&Session>,
    request: &PackRequest,
) -> EngramResult<Pack> {
    let counter = TokenCounter::new();
    let budget = request.budget_tokens.unwrap_or(match request.level {
        DisclosureLevel::Minimal => MINIMAL_PACK_BUDGET,
        DisclosureLevel::Task => TASK_PACK_BUDGET,
        DisclosureLevel::Deep => DEEP_PACK_BUDGET,
    });

    let hot = store.heatmap(None)?;
    let hot_ids: Vec<String> = hot.iter().map(|o| o.id.clone()).collect();

    let mut pack = Pack {
        level: request.level,
        objects: Vec::new(),
        tokens_used: 0,
    };
    let include_excerpts = request.level == DisclosureLevel::Deep;

    let already_injected = |id: &str| {
        session.is_some_and(|s| s.was_injected(id))
    };
    let admit = |object: MemoryObject, pack: &mut Pack| -> bool {
        if already_injected(&object.id) || pack.objects.iter().any(|o| o.id == object.id) {
            return true; // skip, keep filling
        }
        let mut cost = counter.count(&object.content);
        if include_excerpts {
            if let Some(excerpt) = &object.evidence_excerpt {
                cost += counter.count(excerpt);
            }
        }
        if pack.tokens_used + cost > budget {
            return false; // budget exhausted
        }
        pack.tokens_used += cost;
        pack.objects.push(object);
        true
    };

    // Every level starts with active constraints, hot first.
    let mut constraints = store.list_active_by_type_hot_first(ObjectType::Constraint, 50)?;
    promote_hot(&mut constraints, &hot_ids);
    for constraint in constraints {
        if !admit(constraint, &mut pack) {
            break;
        }
    }

    // Task and deep add query- or file-relevant memories.
    if request.level >= DisclosureLevel::Task {
        let query = request
            .query
            .clone()
            .or_else(|| request.file.clone())
            .unwrap_or_default();
        if !query.trim().is_empty() {
            let retriever = Retriever::new(store, embedder);
            let results = retriever.search(
                &query,
                &SearchOptions {
                    limit: 20,
                    // Packs must not reinforce: injection would feed the
                    // heatmap that chose the injection.
                    skip_reinforcement: true,
                    priority_ids: hot_ids.clone(),
                    ..Default::default()
                },
            )?;
            for (object, _) in results {
                if !admit(object, &mut pack) {
                    break;
                }
            }
        }
    }

    // Deep adds recent decisions (with their evidence excerpts counted).
    if request.level == DisclosureLevel::Deep {
        for decision in store.list_recent_by_type(ObjectType::Decision, DEEP_RECENT_DECISIONS)? {
            if !admit(decision, &mut pack) {
                break;
            }
        }
    }

    debug!(
        level = %pack.level,
        objects = pack.objects.len(),
        tokens = pack.tokens_used,
        budget,
        "pack assembled"
    );
    Ok(pack)
}

/// Stable-partition hot ids to the front, preserving relative order.
fn promote_hot(objects: &mut Vec<MemoryObject>, hot_ids: &[String]) {
    objects.sort_by_key(|o| !hot_ids.contains(&o.id));
}

/// Result of a per-turn escalation check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisclosureCheck {
    pub needed: bool,
    pub trigger: Option<String>,
    pub suggested_level: Option<DisclosureLevel>,
}

impl DisclosureCheck {
    fn not_needed() -> Self {
        Self {
            needed: false,
            trigger: None,
            suggested_level: None,
        }
    }

    fn suggest(trigger: &str, level: DisclosureLevel) -> Self {
        Self {
            needed: true,
            trigger: Some(trigger.to_string()),
            suggested_level: Some(level),
        }
    }
}

/// Evaluate the escalation signals for one turn, most specific first.
pub fn check_disclosure(
    session: &Session,
    query: Option<&str>,
    file: Option<&str>,
    config: &EngramConfig,
) -> DisclosureCheck {
    // Explicit memory-recall phrasing always earns the deep level.
    if let Some(q) = query {
        let lowered = q.to_lowercase();
        if RECALL_CUES.iter().any(|cue| lowered.contains(cue)) {
            return DisclosureCheck::suggest("explicit_query", DisclosureLevel::Deep);
        }
    }

    if session.error_count >= config.error_burst_threshold as u64 {
        return DisclosureCheck::suggest("error_burst", session.disclosure_level.escalate());
    }

    if let Some(dir) = file.and_then(parent_dir) {
        let shifted = session.last_topic.as_deref() != Some(dir.as_str());
        if shifted && session.events_since_disclosure() > TOPIC_SHIFT_MIN_EVENTS {
            return DisclosureCheck::suggest("topic_shift", DisclosureLevel::Task);
        }
    }

    if session.events_since_disclosure() >= config.disclosure_threshold as u64 {
        return DisclosureCheck::suggest("cadence", session.disclosure_level);
    }

    DisclosureCheck::not_needed()
}

/// Context-usage recommendation for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageRecommendation {
    Continue,
    CheckpointAndClear,
}

impl UsageRecommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageRecommendation::Continue => "continue",
            UsageRecommendation::CheckpointAndClear => "checkpoint_and_clear",
        }
    }
}

/// Percentage of the assumed context window used, and what to do about it.
pub fn context_usage(total_tokens: usize, config: &EngramConfig) -> (f64, UsageRecommendation) {
    let percent = total_tokens as f64 / CONTEXT_WINDOW_TOKENS as f64 * 100.0;
    let recommendation = if percent >= config.context_threshold_percent as f64 {
        UsageRecommendation::CheckpointAndClear
    } else {
        UsageRecommendation::Continue
    };
    (percent, recommendation)
}
