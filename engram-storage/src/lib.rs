//! # engram-storage
//!
//! SQLite persistence layer for the Engram memory engine: the event
//! journal, the typed object store, the FTS/vector/token indices, and
//! session records — all under one transactional discipline. Virtual
//! tables are kept in sync by explicit writes in the same transaction as
//! the row write; there are no triggers, so the writer controls ordering
//! and partial-failure semantics.

pub mod kernel;
pub mod migrations;
pub mod pragmas;
pub mod queries;
pub mod store;

pub use kernel::StorageKernel;
pub use queries::stats_ops::StoreStats;
pub use store::MemoryStore;

use engram_core::errors::EngramError;

/// Map a low-level failure into the `Storage` error kind.
pub(crate) fn to_storage_err(msg: impl Into<String>) -> EngramError {
    EngramError::Storage(msg.into())
}
