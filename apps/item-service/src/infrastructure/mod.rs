//! Infrastructure Layer
//!
//! Adapters for the ports defined in the application layer:
//!
//! - **Driven Adapters (Outbound)**
//!   - `persistence/`: Storage adapters (in-memory, SQLite, Fjall document store)
//!
//! - **Driver Adapters (Inbound)**
//!   - `http/`: REST API controller
//!
//! - **Cross-cutting**
//!   - `config/`: Environment configuration
//!   - `telemetry/`: Tracing subscriber setup
//!   - `metrics/`: Prometheus counters

pub mod config;
pub mod http;
pub mod metrics;
pub mod persistence;
pub mod telemetry;
