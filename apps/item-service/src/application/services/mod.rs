//! Application Services
//!
//! Backend-agnostic orchestration over the storage port.

mod resource_service;

pub use resource_service::{ITEM_NOT_FOUND_MESSAGE, ResourceService};
