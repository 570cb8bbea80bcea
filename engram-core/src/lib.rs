//! # engram-core
//!
//! Foundation crate for the Engram memory engine.
//! Defines all types, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod deadline;
pub mod errors;
pub mod event;
pub mod memory;
pub mod session;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::EngramConfig;
pub use deadline::Deadline;
pub use errors::{EngramError, EngramResult};
pub use event::{Event, EventType, NewEvent};
pub use memory::{
    CodeRef, ConfidenceLevel, ConfidenceTier, MemoryObject, ObjectDraft, ObjectFilter,
    ObjectPatch, ObjectStatus, ObjectType, OutcomeScore, ReviewStatus, Scope, ScopeKind, Strength,
};
pub use session::{DisclosureLevel, Session};
