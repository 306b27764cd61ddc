//! Persistence Adapters
//!
//! Implementations of [`StoragePort`](crate::application::ports::StoragePort)
//! for each supported backend, plus the factory that picks one from
//! configuration.
//!
//! - [`InMemoryStorage`]: process-local, lost on exit
//! - [`SqliteStorage`]: relational tables in a SQLite file
//! - [`DocumentStorage`]: JSON documents in Fjall keyspaces

mod document;
mod in_memory;
mod sqlite;

use std::sync::Arc;

pub use document::DocumentStorage;
pub use in_memory::InMemoryStorage;
pub use sqlite::SqliteStorage;

use crate::application::ports::SharedStorage;
use crate::domain::StorageError;
use crate::infrastructure::config::StorageSettings;

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// Process-local storage.
    #[default]
    Memory,
    /// SQLite database file.
    Sqlite,
    /// Fjall document store directory.
    Document,
}

impl StorageBackend {
    /// Parse a backend name, ignoring case. Returns `None` for unknown names.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "sqlite" => Some(Self::Sqlite),
            "document" => Some(Self::Document),
            _ => None,
        }
    }

    /// Get the backend name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
            Self::Document => "document",
        }
    }
}

/// Open the configured storage backend.
///
/// # Errors
///
/// Returns [`StorageError::Backend`] if the database file or directory
/// cannot be opened.
pub fn open_storage(settings: &StorageSettings) -> Result<SharedStorage, StorageError> {
    let storage: SharedStorage = match settings.backend {
        StorageBackend::Memory => Arc::new(InMemoryStorage::new()),
        StorageBackend::Sqlite => Arc::new(SqliteStorage::open(&settings.sqlite_path)?),
        StorageBackend::Document => Arc::new(DocumentStorage::open(&settings.document_path)?),
    };

    tracing::info!(backend = storage.backend_name(), "Storage backend ready");
    Ok(storage)
}
