//! Application Ports (Driven)
//!
//! Interfaces the application uses to reach external systems.

mod storage_port;

pub use storage_port::{SharedStorage, StoragePort};
