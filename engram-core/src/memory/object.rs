//! The memory object — a typed, durable statement distilled from events.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::VERIFICATION_WINDOW_DAYS;

use super::strength::{OutcomeScore, Strength};
use super::types::{
    CodeRef, ConfidenceLevel, ConfidenceTier, ObjectStatus, ObjectType, ReviewStatus, Scope,
};

/// A durable memory object. Created by the curator or an explicit `add`,
/// mutated by reinforcement and supersession, never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryObject {
    /// UUID v4 identifier.
    pub id: String,
    /// The statement itself.
    pub content: String,
    /// Type of memory.
    pub object_type: ObjectType,
    /// Where this memory applies.
    pub scope: Scope,
    /// Lifecycle status (forward-only transitions).
    pub status: ObjectStatus,
    /// Stated confidence at creation time.
    pub confidence: ConfidenceLevel,
    /// Ids of objects this one replaced.
    pub supersedes: Vec<String>,
    /// Id of the object that replaced this one.
    pub superseded_by: Option<String>,
    /// Journal events backing this memory.
    pub evidence_event_ids: Vec<String>,
    /// Short quote from the evidence.
    pub evidence_excerpt: Option<String>,
    /// Code anchors.
    pub code_refs: Vec<CodeRef>,
    /// Human review state.
    pub review_status: ReviewStatus,
    /// When the review decision was made.
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Last retrieval that touched this object.
    pub last_accessed: Option<DateTime<Utc>>,
    pub access_count: u64,
    /// Decaying strength in `[0.01, 1.0]`.
    pub strength: Strength,
    /// Last reinforcement timestamp.
    pub last_reinforced_at: Option<DateTime<Utc>>,
    /// Usefulness score; 0.5 is neutral.
    pub outcome_score: OutcomeScore,
    /// Last staleness re-validation.
    pub last_verified_at: Option<DateTime<Utc>>,
}

impl MemoryObject {
    /// Derived evidence tier. Pure function of review status, code refs,
    /// evidence events, and verification recency.
    pub fn confidence_tier(&self) -> ConfidenceTier {
        self.confidence_tier_at(Utc::now())
    }

    /// Tier as of a given instant (the 30-day verification window is
    /// measured against it).
    pub fn confidence_tier_at(&self, now: DateTime<Utc>) -> ConfidenceTier {
        let approved = self.review_status == ReviewStatus::Approved;
        let recently_verified = self
            .last_verified_at
            .is_some_and(|t| now - t <= Duration::days(VERIFICATION_WINDOW_DAYS));

        if approved && (!self.code_refs.is_empty() || recently_verified) {
            ConfidenceTier::Grounded
        } else if !self.evidence_event_ids.is_empty() {
            ConfidenceTier::Observed
        } else if approved {
            ConfidenceTier::Inferred
        } else {
            ConfidenceTier::Hypothesis
        }
    }

    /// Whether this object participates in retrieval and conflict checks.
    pub fn is_active(&self) -> bool {
        self.status == ObjectStatus::Active
    }

    /// Whether `other` is linked to this object through supersession.
    pub fn supersession_linked(&self, other: &MemoryObject) -> bool {
        self.superseded_by.as_deref() == Some(other.id.as_str())
            || other.superseded_by.as_deref() == Some(self.id.as_str())
            || self.supersedes.iter().any(|id| id == &other.id)
            || other.supersedes.iter().any(|id| id == &self.id)
    }
}

/// Input for creating a memory object. The store fills defaults:
/// `status=active`, `strength=1.0`, `outcome_score=0.5`, `review=pending`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectDraft {
    pub content: String,
    pub object_type: ObjectType,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub confidence: ConfidenceLevel,
    #[serde(default)]
    pub evidence_event_ids: Vec<String>,
    #[serde(default)]
    pub evidence_excerpt: Option<String>,
    #[serde(default)]
    pub code_refs: Vec<CodeRef>,
}

impl ObjectDraft {
    pub fn new(object_type: ObjectType, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            object_type,
            ..Default::default()
        }
    }
}

/// Partial update for an existing object. `None` fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectPatch {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub confidence: Option<ConfidenceLevel>,
    #[serde(default)]
    pub scope: Option<Scope>,
    #[serde(default)]
    pub outcome_score: Option<f64>,
    #[serde(default)]
    pub review_status: Option<ReviewStatus>,
    #[serde(default)]
    pub code_refs: Option<Vec<CodeRef>>,
    #[serde(default)]
    pub evidence_excerpt: Option<String>,
}

impl ObjectPatch {
    /// True when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.confidence.is_none()
            && self.scope.is_none()
            && self.outcome_score.is_none()
            && self.review_status.is_none()
            && self.code_refs.is_none()
            && self.evidence_excerpt.is_none()
    }
}

/// Filter for listing objects.
#[derive(Debug, Clone, Default)]
pub struct ObjectFilter {
    pub object_type: Option<ObjectType>,
    pub status: Option<ObjectStatus>,
    pub scope_kind: Option<super::types::ScopeKind>,
    pub review_status: Option<ReviewStatus>,
    pub limit: Option<usize>,
}

impl ObjectFilter {
    /// Active objects of one type.
    pub fn active(object_type: ObjectType) -> Self {
        Self {
            object_type: Some(object_type),
            status: Some(ObjectStatus::Active),
            ..Default::default()
        }
    }
}
