//! Direct contradictions: negation asymmetry or antonym pairs.

use std::sync::LazyLock;

use regex::Regex;

use engram_core::memory::MemoryObject;

use crate::resolution::suggest_resolution;
use crate::{Conflict, ConflictKind};

use super::{content_words, jaccard};

/// Negation cues that flip a statement's polarity.
static NEGATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:don't|do\s+not|never|avoid|stop|no\s+longer|must\s+not|shouldn't|not)\b")
        .unwrap()
});

/// Word pairs that contradict each other when said about the same context.
const ANTONYM_PAIRS: &[(&str, &str)] = &[
    ("use", "avoid"),
    ("tabs", "spaces"),
    ("always", "never"),
    ("enable", "disable"),
    ("add", "remove"),
    ("sync", "async"),
    ("allow", "forbid"),
];

/// Minimum word overlap for a negation-based direct conflict.
const NEGATION_OVERLAP: f64 = 0.4;

/// Minimum context overlap for an antonym-based direct conflict.
const ANTONYM_OVERLAP: f64 = 0.3;

pub fn detect(a: &MemoryObject, b: &MemoryObject) -> Option<Conflict> {
    let a_words = content_words(&a.content);
    let b_words = content_words(&b.content);

    // Negation asymmetry: one side negates, the other states, same topic.
    let a_negates = NEGATION_RE.is_match(&a.content);
    let b_negates = NEGATION_RE.is_match(&b.content);
    if a_negates != b_negates && jaccard(&a_words, &b_words) > NEGATION_OVERLAP {
        return Some(conflict(
            a,
            b,
            format!("one statement negates the other: '{}' vs '{}'", a.content, b.content),
            0.75,
        ));
    }

    // Antonym pair on overlapping context.
    for (left, right) in ANTONYM_PAIRS {
        let forward = a_words.contains(*left) && b_words.contains(*right);
        let backward = a_words.contains(*right) && b_words.contains(*left);
        if !forward && !backward {
            continue;
        }
        let mut a_ctx = a_words.clone();
        let mut b_ctx = b_words.clone();
        for w in [left, right] {
            a_ctx.remove(*w);
            b_ctx.remove(*w);
        }
        if jaccard(&a_ctx, &b_ctx) > ANTONYM_OVERLAP {
            return Some(conflict(
                a,
                b,
                format!("antonym pair '{left}/{right}' over shared context"),
                0.7,
            ));
        }
    }

    None
}

fn conflict(a: &MemoryObject, b: &MemoryObject, description: String, confidence: f64) -> Conflict {
    Conflict {
        memory_ids: [a.id.clone(), b.id.clone()],
        kind: ConflictKind::Direct,
        description,
        suggested_resolution: suggest_resolution(a, b),
        confidence,
    }
}
