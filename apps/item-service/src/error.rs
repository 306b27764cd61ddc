//! Service error taxonomy.
//!
//! Every failed operation ends in exactly one of these codes. The HTTP layer
//! maps the code to a status; storage failures are classified once, at the
//! adapter boundary, and arrive here as [`StorageError`].
//!
//! # HTTP Status Codes
//!
//! | Code | Status | Usage |
//! |------|--------|-------|
//! | `VALIDATION_ERROR` | 400 | Missing or malformed input |
//! | `UNAUTHORIZED` | 401 | Unknown user or wrong password |
//! | `NOT_FOUND` | 404 | Unknown item id |
//! | `CONFLICT` | 409 | Duplicate username |
//! | `BACKEND_UNAVAILABLE` | 500 | Storage failure |

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::StorageError;

/// Message returned for every backend failure. Backend detail stays in logs.
pub const BACKEND_FAILURE_MESSAGE: &str = "Internal server error";

/// Error codes for the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Required input missing or malformed.
    ValidationError,
    /// Duplicate unique key.
    Conflict,
    /// Bad credentials.
    Unauthorized,
    /// Unknown id.
    NotFound,
    /// Storage failure of any kind.
    BackendUnavailable,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::ValidationError => StatusCode::BAD_REQUEST,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BackendUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error reason string.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::Conflict => "CONFLICT",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound => "NOT_FOUND",
            Self::BackendUnavailable => "BACKEND_UNAVAILABLE",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// A failed service operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ServiceError {
    code: ErrorCode,
    message: String,
}

impl ServiceError {
    /// Create a new service error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Get the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Get the client-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Build the JSON error body.
    #[must_use]
    pub fn to_http_response(&self) -> HttpErrorResponse {
        HttpErrorResponse {
            error: self.message.clone(),
            code: self.code.reason().to_string(),
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.reason(), self.message)
    }
}

/// Convenience constructors for common errors.
impl ServiceError {
    /// Missing or malformed input.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// Duplicate unique key.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Bad credentials.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Unknown id.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Storage failure.
    #[must_use]
    pub fn backend_unavailable() -> Self {
        Self::new(ErrorCode::BackendUnavailable, BACKEND_FAILURE_MESSAGE)
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => Self::not_found("Record not found"),
            StorageError::AlreadyExists => Self::conflict("Record already exists"),
            StorageError::Backend(detail) => {
                tracing::error!(error = %detail, "Storage backend failure");
                Self::backend_unavailable()
            }
        }
    }
}

/// HTTP error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpErrorResponse {
    /// Human-readable message.
    pub error: String,
    /// Error code string.
    pub code: String,
}
