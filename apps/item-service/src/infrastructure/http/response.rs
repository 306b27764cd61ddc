//! HTTP response bodies.

use axum::Json;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Plain message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message text.
    pub message: String,
}

impl MessageResponse {
    /// Create a message body.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Health status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Active storage backend.
    pub backend: String,
    /// Seconds since the router was built.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (self.code().http_status(), Json(self.to_http_response())).into_response()
    }
}
