// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Item Service - Resource CRUD over pluggable storage
//!
//! A JSON HTTP service exposing create/list/get/update/delete for items and
//! plain username/password registration and login. Every operation goes
//! through one storage port, so the same service runs over any backend.
//!
//! # Architecture (Clean Architecture + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Records and rules with no I/O
//!   - `item`: `Item`, `ItemId`, `NewItem`, `ItemPatch` merge rule
//!   - `user`: `User`, `UserId`, `NewUser`
//!   - `errors`: `StorageError` classification
//!
//! - **Application**: Orchestration
//!   - `ports`: `StoragePort`
//!   - `services`: `ResourceService`
//!   - `dto`: Request and response shapes
//!
//! - **Infrastructure**: Adapters
//!   - `persistence`: In-memory, SQLite and document-store adapters
//!   - `http`: Axum router
//!   - `config`, `telemetry`, `metrics`
//!
//! # Request Flow
//!
//! ```text
//! HTTP request ──► Router ──► ResourceService ──► StoragePort ──► backend
//!                    ▲               │
//!                    └─ status+JSON ◄┘ ServiceError / result
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Records and rules with no external dependencies.
pub mod domain;

/// Application layer - Service orchestration and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

/// Service error taxonomy.
pub mod error;

// =============================================================================
// Re-exports
// =============================================================================

pub use application::ports::{SharedStorage, StoragePort};
pub use application::services::ResourceService;
pub use domain::{Item, ItemId, ItemPatch, NewItem, NewUser, StorageError, User, UserId};
pub use error::{ErrorCode, ServiceError};
pub use infrastructure::config::{ConfigError, ServiceConfig};
pub use infrastructure::http::{AppState, create_router};
pub use infrastructure::metrics::init_metrics;
pub use infrastructure::persistence::{
    DocumentStorage, InMemoryStorage, SqliteStorage, StorageBackend, open_storage,
};
