//! HTTP/REST API adapter.
//!
//! Inbound adapter mapping routes onto [`ResourceService`](crate::application::services::ResourceService)
//! operations and their results onto status codes.

mod controller;
mod request;
mod response;

pub use controller::{AppState, create_router};
pub use request::JsonBody;
pub use response::{HealthResponse, MessageResponse};
