//! # engram-extract
//!
//! Deterministic text processing for the ingestion path:
//!
//! - [`normalizer`] — content hashing, blob/synopsis decisions, structured
//!   signal extraction from tool output and diffs.
//! - [`tokens`] — code-like token extraction (identifiers, paths, flags,
//!   versions, error codes, env vars) feeding the token index.
//! - [`facts`] — ordered-pattern subject/predicate/object extraction with
//!   temporal anchoring. No external calls.

pub mod facts;
pub mod normalizer;
pub mod tokens;

pub use facts::{extract_facts, CandidateFact, Utterance};
pub use normalizer::{content_hash, normalize_event, NormalizedEvent, StructuredSignals};
pub use tokens::{extract_code_tokens, CodeToken, TokenKind};
