//! Configuration Module
//!
//! Configuration loading for the item service.

mod settings;

pub use settings::{
    ConfigError, DEFAULT_DOCUMENT_PATH, DEFAULT_SQLITE_PATH, ServerSettings, ServiceConfig,
    StorageSettings,
};
