//! # engram-retrieval
//!
//! The hybrid retriever. Fans a query out over a fixed set of named
//! branches (lexical BM25, vector cosine, token index), min-max
//! normalizes each branch, fuses with weights renormalized over the
//! branches that actually ran, then composes the decay-aware effective
//! score. Returned objects are reinforced unless the caller opts out.

pub mod engine;
pub mod fusion;

pub use engine::{Retriever, SearchOptions};
pub use fusion::{fuse, BranchOutput};
