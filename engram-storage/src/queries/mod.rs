//! SQL query modules, one per concern. Callers wrap these in transactions
//! via [`crate::kernel::StorageKernel::with_tx`].

pub mod event_ops;
pub mod fts;
pub mod object_crud;
pub mod object_lifecycle;
pub mod object_query;
pub mod session_ops;
pub mod stats_ops;
pub mod token_ops;
pub mod vector_ops;
