//! Storage error classification.
//!
//! Adapters translate backend-specific failures (driver error codes, lock
//! poisoning, I/O) into one of these variants exactly once. Nothing above the
//! storage port inspects backend errors directly.

use thiserror::Error;

/// Errors reported by a storage adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// No record exists for the requested key.
    #[error("record not found")]
    NotFound,

    /// A record with the same unique key already exists.
    #[error("record already exists")]
    AlreadyExists,

    /// The backend failed or is unreachable.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Wrap any displayable backend failure.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Backend(format!("document encoding: {err}"))
    }
}

impl From<tokio::task::JoinError> for StorageError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Backend(format!("storage task failed: {err}"))
    }
}
