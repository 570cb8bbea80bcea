//! # engram-conflict
//!
//! Pairwise contradiction detection over active memory objects.
//!
//! Three strategies, tried in order per pair:
//! - **direct** — one side negates, or an antonym pair on shared context;
//! - **implicit** — both recommend different members of a known
//!   mutually-exclusive set (frameworks, databases, ...);
//! - **temporal** — same opinionated type, heavy overlap, created far
//!   apart, with no supersession link.
//!
//! Retired objects and supersession-linked pairs are never reported.

pub mod detection;
pub mod resolution;

use serde::{Deserialize, Serialize};

use engram_core::memory::MemoryObject;

pub use resolution::{suggest_resolution, Resolution};

/// Kind of contradiction found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Direct,
    Implicit,
    Temporal,
}

impl ConflictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictKind::Direct => "direct",
            ConflictKind::Implicit => "implicit",
            ConflictKind::Temporal => "temporal",
        }
    }
}

/// A detected contradiction between two memories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    /// The two conflicting memory ids.
    pub memory_ids: [String; 2],
    pub kind: ConflictKind,
    pub description: String,
    pub suggested_resolution: Resolution,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f64,
}

/// Detect a conflict between one pair. Strategies run in order; the first
/// hit wins. Returns `None` for ineligible pairs.
pub fn detect_pair(a: &MemoryObject, b: &MemoryObject) -> Option<Conflict> {
    if !a.is_active() || !b.is_active() || a.id == b.id || a.supersession_linked(b) {
        return None;
    }

    detection::direct::detect(a, b)
        .or_else(|| detection::implicit::detect(a, b))
        .or_else(|| detection::temporal::detect(a, b))
}

/// Scan a slice of objects for all pairwise conflicts.
pub fn find_conflicts(objects: &[MemoryObject]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    for (i, a) in objects.iter().enumerate() {
        for b in &objects[i + 1..] {
            if let Some(c) = detect_pair(a, b) {
                conflicts.push(c);
            }
        }
    }
    conflicts
}

/// Conflicts between one candidate and a set of existing objects.
pub fn conflicts_against(candidate: &MemoryObject, existing: &[MemoryObject]) -> Vec<Conflict> {
    existing
        .iter()
        .filter_map(|other| detect_pair(candidate, other))
        .collect()
}
