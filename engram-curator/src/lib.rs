//! # engram-curator
//!
//! The checkpoint-driven curator. Buffers each session's events, fires
//! auto-triggers (cadence, tool burst, task completion, error burst), and
//! on checkpoint distills the buffered episode into typed memory-object
//! candidates via a registry of deterministic Tier-0 producers, with an
//! optional higher-tier extractor layered on top. Candidates are deduped
//! against the store and gated by the conflict detector before writing.

pub mod buffer;
pub mod engine;
pub mod producers;

pub use buffer::{CheckpointTrigger, EventBuffer};
pub use engine::{CheckpointOutcome, Curator};
pub use producers::{registry, Candidate, Producer};
