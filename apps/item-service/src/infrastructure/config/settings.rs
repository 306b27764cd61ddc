//! Service Configuration Settings
//!
//! Configuration types for the item service, loaded from environment variables.

use std::path::PathBuf;

use crate::infrastructure::persistence::StorageBackend;

/// Default SQLite database file.
pub const DEFAULT_SQLITE_PATH: &str = "./data/items.db";

/// Default document store directory.
pub const DEFAULT_DOCUMENT_PATH: &str = "./data/documents";

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Bind address.
    pub bind_address: String,
    /// HTTP port.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerSettings {
    /// Socket address string for the listener.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Storage backend settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    /// Selected backend.
    pub backend: StorageBackend,
    /// SQLite database file, used by the `sqlite` backend.
    pub sqlite_path: PathBuf,
    /// Document store directory, used by the `document` backend.
    pub document_path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            sqlite_path: PathBuf::from(DEFAULT_SQLITE_PATH),
            document_path: PathBuf::from(DEFAULT_DOCUMENT_PATH),
        }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// HTTP listener settings.
    pub server: ServerSettings,
    /// Storage backend settings.
    pub storage: StorageSettings,
    /// Whether the Prometheus recorder is installed.
    pub metrics_enabled: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            storage: StorageSettings::default(),
            metrics_enabled: true,
        }
    }
}

impl ServiceConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to a value that cannot be used.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to a value that cannot be used.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let server = ServerSettings {
            bind_address: lookup("BIND_ADDRESS")
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.server.bind_address),
            port: parse_u16(&lookup, "PORT", defaults.server.port)?,
        };

        let backend = match lookup("STORAGE_BACKEND") {
            Some(value) if !value.is_empty() => StorageBackend::from_str_case_insensitive(&value)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: "STORAGE_BACKEND".to_string(),
                    value,
                })?,
            _ => defaults.storage.backend,
        };

        let storage = StorageSettings {
            backend,
            sqlite_path: lookup("SQLITE_PATH")
                .filter(|v| !v.is_empty())
                .map_or(defaults.storage.sqlite_path, PathBuf::from),
            document_path: lookup("DOCUMENT_PATH")
                .filter(|v| !v.is_empty())
                .map_or(defaults.storage.document_path, PathBuf::from),
        };

        let metrics_enabled = lookup("METRICS_ENABLED")
            .map_or(defaults.metrics_enabled, |v| v.to_lowercase() != "false");

        Ok(Self {
            server,
            storage,
            metrics_enabled,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable has a value that cannot be used.
    #[error("invalid value for environment variable {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Rejected value.
        value: String,
    },
}

fn parse_u16<F>(lookup: &F, key: &str, default: u16) -> Result<u16, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.is_empty() => {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value,
                })
        }
        _ => Ok(default),
    }
}
