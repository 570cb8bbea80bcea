pub mod object;
pub mod strength;
pub mod types;

pub use object::{MemoryObject, ObjectDraft, ObjectFilter, ObjectPatch};
pub use strength::{OutcomeScore, Strength};
pub use types::{
    CodeRef, ConfidenceLevel, ConfidenceTier, ObjectStatus, ObjectType, ReviewStatus, Scope,
    ScopeKind,
};
