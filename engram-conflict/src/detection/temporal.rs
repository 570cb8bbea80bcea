//! Temporal contradictions: same opinionated type, heavy overlap, created
//! far apart, with no supersession link recorded.

use chrono::Duration;

use engram_core::memory::MemoryObject;

use crate::{Conflict, ConflictKind, Resolution};

use super::{content_words, jaccard};

/// Minimum word overlap to call two statements "the same topic".
const TOPIC_OVERLAP: f64 = 0.5;

/// Creation times must differ by more than this.
const MIN_AGE_GAP_HOURS: i64 = 24;

pub fn detect(a: &MemoryObject, b: &MemoryObject) -> Option<Conflict> {
    if !a.object_type.is_opinionated() || !b.object_type.is_opinionated() {
        return None;
    }

    let gap = (a.created_at - b.created_at).abs();
    if gap <= Duration::hours(MIN_AGE_GAP_HOURS) {
        return None;
    }

    let overlap = jaccard(&content_words(&a.content), &content_words(&b.content));
    if overlap <= TOPIC_OVERLAP {
        return None;
    }

    let (older, newer) = if a.created_at <= b.created_at { (a, b) } else { (b, a) };
    Some(Conflict {
        memory_ids: [older.id.clone(), newer.id.clone()],
        kind: ConflictKind::Temporal,
        description: format!(
            "likely restatement {} apart: '{}' vs newer '{}'",
            human_gap(gap),
            older.content,
            newer.content
        ),
        suggested_resolution: Resolution::KeepNewer,
        confidence: (0.4 + overlap / 2.0).min(0.9),
    })
}

fn human_gap(gap: Duration) -> String {
    let days = gap.num_days();
    if days > 0 {
        format!("{days}d")
    } else {
        format!("{}h", gap.num_hours())
    }
}
