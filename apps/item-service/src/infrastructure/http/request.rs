//! Request body extraction.
//!
//! Mutating routes accept a JSON object. The body is read as raw bytes so
//! that every malformed payload becomes a `VALIDATION_ERROR` response rather
//! than a framework rejection. An empty body reads as `{}` and no particular
//! `Content-Type` is required.

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::error::ServiceError;

const NOT_AN_OBJECT_MESSAGE: &str = "Request body must be a JSON object";
const UNREADABLE_BODY_MESSAGE: &str = "Request body could not be read";

/// A request body parsed from a JSON object.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| ServiceError::validation(UNREADABLE_BODY_MESSAGE))?;
        parse_body(&bytes).map(Self)
    }
}

/// Parse a request body into `T`.
///
/// # Errors
///
/// Returns a validation error if the body is not a JSON object or a field
/// has the wrong type.
pub fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ServiceError> {
    let value = if bytes.iter().all(u8::is_ascii_whitespace) {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_slice(bytes).map_err(|e| {
            tracing::debug!(error = %e, "Rejected malformed request body");
            ServiceError::validation(NOT_AN_OBJECT_MESSAGE)
        })?
    };

    if !value.is_object() {
        return Err(ServiceError::validation(NOT_AN_OBJECT_MESSAGE));
    }

    serde_json::from_value(value).map_err(|e| {
        tracing::debug!(error = %e, "Rejected request body fields");
        ServiceError::validation(format!("Invalid request body: {e}"))
    })
}
