//! Traits for the external collaborators the core consumes.
//!
//! The embedding model and the LLM-backed extractor live outside this
//! system; the core only sees these interfaces. Both are optional, and
//! every consumer degrades per the `Dependency` error contract when one
//! is absent.

use serde::{Deserialize, Serialize};

use crate::errors::EngramResult;
use crate::event::Event;
use crate::memory::{ConfidenceLevel, ObjectType};

/// Embedding provider. Implementations must return unit-norm vectors.
pub trait IEmbedder: Send + Sync {
    /// Embed a single text, returning a unit-norm vector.
    fn embed(&self, text: &str) -> EngramResult<Vec<f32>>;

    /// The dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Whether this provider is currently usable.
    fn is_available(&self) -> bool {
        true
    }
}

/// A memory candidate proposed by a higher-tier extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedCandidate {
    pub content: String,
    pub object_type: ObjectType,
    pub confidence: ConfidenceLevel,
}

/// Optional higher-tier (LLM-backed) candidate extractor consulted at
/// checkpoints. Tier-0 rule output is always produced regardless.
pub trait IExtractor: Send + Sync {
    /// Propose candidate memories from an episode of events.
    fn extract(&self, events: &[Event], max: usize) -> EngramResult<Vec<ExtractedCandidate>>;

    /// Human-readable extractor name.
    fn name(&self) -> &str;

    /// Whether this extractor is currently usable.
    fn is_available(&self) -> bool {
        true
    }
}
