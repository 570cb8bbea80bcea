//! Implicit contradictions: different members of a mutually-exclusive set,
//! both phrased as a recommendation.

use std::sync::LazyLock;

use regex::Regex;

use engram_core::memory::MemoryObject;

use crate::resolution::suggest_resolution;
use crate::{Conflict, ConflictKind};

/// Sets where picking one member normally excludes the others.
const EXCLUSIVE_SETS: &[(&str, &[&str])] = &[
    ("frontend framework", &["react", "vue", "angular", "svelte", "solid"]),
    ("database", &["postgres", "postgresql", "mysql", "sqlite", "mongodb", "mariadb"]),
    ("package manager", &["npm", "yarn", "pnpm", "bun"]),
    ("test runner", &["jest", "vitest", "mocha", "jasmine", "ava"]),
    ("indentation", &["tabs", "spaces"]),
];

/// Both statements must read as a recommendation for the pair to conflict.
static RECOMMENDATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:use|prefer|choose|chose|pick|decided?|decision|always|standardize)\b")
        .unwrap()
});

pub fn detect(a: &MemoryObject, b: &MemoryObject) -> Option<Conflict> {
    if !RECOMMENDATION_RE.is_match(&a.content) || !RECOMMENDATION_RE.is_match(&b.content) {
        return None;
    }

    let a_lower = a.content.to_lowercase();
    let b_lower = b.content.to_lowercase();

    for (set_name, members) in EXCLUSIVE_SETS {
        let a_member = members.iter().find(|m| contains_word(&a_lower, m));
        let b_member = members.iter().find(|m| contains_word(&b_lower, m));
        if let (Some(am), Some(bm)) = (a_member, b_member) {
            // "postgresql" and "postgres" are the same pick, not a conflict.
            if am == bm || am.starts_with(*bm) || bm.starts_with(*am) {
                continue;
            }
            return Some(Conflict {
                memory_ids: [a.id.clone(), b.id.clone()],
                kind: ConflictKind::Implicit,
                description: format!(
                    "both recommend a {set_name}, but disagree: '{am}' vs '{bm}'"
                ),
                suggested_resolution: suggest_resolution(a, b),
                confidence: 0.85,
            });
        }
    }

    None
}

/// Word-boundary containment without building a regex per member.
fn contains_word(haystack: &str, word: &str) -> bool {
    haystack
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| w == word)
}
