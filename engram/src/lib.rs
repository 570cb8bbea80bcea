//! # engram
//!
//! The persistent agent memory engine. Journals conversational and
//! tool-execution events, distills them into typed memory objects at
//! checkpoints, and serves them back as ranked context packs.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use engram::Engram;
//! use engram_core::{EngramConfig, EventType, NewEvent};
//!
//! let engine = Engram::open_in_memory(EngramConfig::default())?;
//! let session = engine.session_start("/work/project")?;
//!
//! engine.ingest(NewEvent::new(&session.id, EventType::Turn,
//!     "[user]: Never commit directly to main"))?;
//! let outcome = engine.checkpoint(&session.id, "manual")?;
//!
//! let hits = engine.search("commit to main", &Default::default())?;
//! ```

pub mod engine;
pub mod queue;
pub mod registry;
pub mod staleness;

pub use engine::{Engram, EngineStats, IngestReceipt};
pub use queue::{IngestQueue, Receipt};
pub use staleness::{staleness_report, StaleObject, StalenessReport};

// The operation surface re-exports what callers need without reaching
// into the component crates.
pub use engram_core::{
    CodeRef, ConfidenceLevel, ConfidenceTier, Deadline, DisclosureLevel, EngramConfig,
    EngramError, EngramResult, Event, EventType, MemoryObject, NewEvent, ObjectDraft,
    ObjectFilter, ObjectPatch, ObjectStatus, ObjectType, ReviewStatus, Scope, ScopeKind, Session,
};
pub use engram_conflict::{Conflict, ConflictKind, Resolution};
pub use engram_curator::{CheckpointOutcome, CheckpointTrigger};
pub use engram_retrieval::SearchOptions;
pub use engram_session::{
    context_usage, DisclosureCheck, Pack, PackRequest, UsageRecommendation,
};
pub use engram_storage::StoreStats;
