//! Tagged error kinds shared by every crate in the workspace.
//!
//! Transactional writes roll back on any non-`Dependency` error.
//! `Dependency` failures degrade: the affected branch or tier is skipped
//! and the caller continues with what remains.

/// Umbrella error for all Engram operations.
#[derive(Debug, thiserror::Error)]
pub enum EngramError {
    /// Malformed request: unknown object type, empty query, missing session.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An id that does not exist in this memory root.
    #[error("not found: {0}")]
    NotFound(String),

    /// Supersedes cycle, duplicate hash in a unique context, or write conflict.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Deadline expired or the caller cancelled.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Embedder, extractor, or tokenizer failed. Fallback-safe call sites
    /// suppress this and continue degraded.
    #[error("dependency unavailable: {0}")]
    Dependency(String),

    /// Database or IO failure. Fatal for the current call.
    #[error("storage error: {0}")]
    Storage(String),

    /// The curator refused a candidate pending user resolution.
    #[error("policy hold: {0}")]
    PolicyHold(String),
}

/// Result alias used across the workspace.
pub type EngramResult<T> = std::result::Result<T, EngramError>;

impl EngramError {
    /// CLI exit code: 0 success, 1 user error, 2 storage error, 3 cancelled.
    pub fn exit_code(&self) -> i32 {
        match self {
            EngramError::InvalidInput(_)
            | EngramError::NotFound(_)
            | EngramError::Conflict(_)
            | EngramError::PolicyHold(_) => 1,
            EngramError::Storage(_) | EngramError::Dependency(_) => 2,
            EngramError::Cancelled(_) => 3,
        }
    }

    /// Whether a transactional write should roll back on this error.
    pub fn rolls_back(&self) -> bool {
        !matches!(self, EngramError::Dependency(_))
    }
}

impl From<std::io::Error> for EngramError {
    fn from(e: std::io::Error) -> Self {
        EngramError::Storage(e.to_string())
    }
}
