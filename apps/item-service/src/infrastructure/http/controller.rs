//! HTTP Controller (Driver Adapter)
//!
//! Axum-based REST API that delegates to [`ResourceService`].
//!
//! # Endpoints
//!
//! | Method | Path | Success |
//! |--------|------|---------|
//! | `GET` | `/` | 200 greeting |
//! | `POST` | `/register` | 201 `{id, username}` |
//! | `POST` | `/login` | 200 `{message}` |
//! | `POST` | `/items` | 201 created item |
//! | `GET` | `/items` | 200 item list |
//! | `GET` | `/items/{id}` | 200 item |
//! | `PUT` | `/items/{id}` | 200 updated item |
//! | `DELETE` | `/items/{id}` | 200 deleted item |
//! | `GET` | `/health` | 200 health status |
//! | `GET` | `/metrics` | 200 Prometheus text, 503 when disabled |

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use chrono::Utc;

use crate::application::dto::{
    CreateItemDto, LoginDto, LoginResultDto, RegisterUserDto, RegisteredUserDto, UpdateItemDto,
};
use crate::application::ports::StoragePort;
use crate::application::services::ResourceService;
use crate::domain::Item;
use crate::error::ServiceError;
use crate::infrastructure::metrics::get_metrics_handle;

use super::request::JsonBody;
use super::response::{HealthResponse, MessageResponse};

const GREETING: &str = "Hello! world";

/// Application state shared across handlers.
pub struct AppState<S>
where
    S: StoragePort + ?Sized,
{
    /// Item and user operations.
    pub service: ResourceService<S>,
    /// Application version.
    pub version: String,
    /// When the state was built, for uptime reporting.
    pub started_at: Instant,
}

impl<S> AppState<S>
where
    S: StoragePort + ?Sized,
{
    /// Build state over a storage adapter.
    pub fn new(storage: Arc<S>, version: impl Into<String>) -> Self {
        Self {
            service: ResourceService::new(storage),
            version: version.into(),
            started_at: Instant::now(),
        }
    }
}

impl<S> Clone for AppState<S>
where
    S: StoragePort + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            version: self.version.clone(),
            started_at: self.started_at,
        }
    }
}

/// Create the HTTP router with all endpoints.
pub fn create_router<S>(state: AppState<S>) -> Router
where
    S: StoragePort + ?Sized + 'static,
{
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check::<S>))
        .route("/metrics", get(metrics_handler))
        .route("/register", post(register::<S>))
        .route("/login", post(login::<S>))
        .route("/items", get(list_items::<S>).post(create_item::<S>))
        .route(
            "/items/{id}",
            get(get_item::<S>)
                .put(update_item::<S>)
                .delete(delete_item::<S>),
        )
        .with_state(state)
}

async fn root() -> impl IntoResponse {
    Json(MessageResponse::new(GREETING))
}

/// Health check endpoint.
async fn health_check<S>(State(state): State<AppState<S>>) -> impl IntoResponse
where
    S: StoragePort + ?Sized,
{
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        backend: state.service.storage().backend_name().to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
    })
}

async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                handle.render(),
            )
        },
    )
}

async fn register<S>(
    State(state): State<AppState<S>>,
    JsonBody(request): JsonBody<RegisterUserDto>,
) -> Result<(StatusCode, Json<RegisteredUserDto>), ServiceError>
where
    S: StoragePort + ?Sized,
{
    let user = state.service.register(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login<S>(
    State(state): State<AppState<S>>,
    JsonBody(request): JsonBody<LoginDto>,
) -> Result<Json<LoginResultDto>, ServiceError>
where
    S: StoragePort + ?Sized,
{
    state.service.login(request).await.map(Json)
}

async fn create_item<S>(
    State(state): State<AppState<S>>,
    JsonBody(request): JsonBody<CreateItemDto>,
) -> Result<(StatusCode, Json<Item>), ServiceError>
where
    S: StoragePort + ?Sized,
{
    let item = state.service.create_item(request).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn list_items<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<Item>>, ServiceError>
where
    S: StoragePort + ?Sized,
{
    state.service.list_items().await.map(Json)
}

async fn get_item<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<Item>, ServiceError>
where
    S: StoragePort + ?Sized,
{
    let id = ResourceService::<S>::parse_item_id(&id)?;
    state.service.get_item(id).await.map(Json)
}

async fn update_item<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UpdateItemDto>,
) -> Result<Json<Item>, ServiceError>
where
    S: StoragePort + ?Sized,
{
    let id = ResourceService::<S>::parse_item_id(&id)?;
    state.service.update_item(id, request).await.map(Json)
}

async fn delete_item<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<Item>, ServiceError>
where
    S: StoragePort + ?Sized,
{
    let id = ResourceService::<S>::parse_item_id(&id)?;
    state.service.delete_item(id).await.map(Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::SharedStorage;
    use crate::domain::{ItemId, ItemPatch, NewItem, NewUser, StorageError, User};
    use crate::error::{BACKEND_FAILURE_MESSAGE, HttpErrorResponse};
    use crate::infrastructure::persistence::InMemoryStorage;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use mockall::mock;
    use tower::ServiceExt;

    mock! {
        Storage {}

        #[async_trait]
        impl StoragePort for Storage {
            fn backend_name(&self) -> &'static str;
            async fn create_item(&self, item: NewItem) -> Result<Item, StorageError>;
            async fn get_item(&self, id: ItemId) -> Result<Item, StorageError>;
            async fn list_items(&self) -> Result<Vec<Item>, StorageError>;
            async fn update_item(&self, id: ItemId, patch: ItemPatch) -> Result<Item, StorageError>;
            async fn delete_item(&self, id: ItemId) -> Result<Item, StorageError>;
            async fn create_user(&self, user: NewUser) -> Result<User, StorageError>;
            async fn find_user_by_username(&self, username: &str) -> Result<User, StorageError>;
            async fn reset(&self) -> Result<(), StorageError>;
        }
    }

    fn memory_router() -> Router {
        let storage: SharedStorage = Arc::new(InMemoryStorage::new());
        create_router(AppState::new(storage, "1.0.0-test"))
    }

    fn request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn root_greets() {
        let response = memory_router()
            .oneshot(request("GET", "/", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"message": "Hello! world"})
        );
    }

    #[tokio::test]
    async fn health_check_reports_backend() {
        let response = memory_router()
            .oneshot(request("GET", "/health", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], "1.0.0-test");
        assert_eq!(body["backend"], "memory");
    }

    #[tokio::test]
    async fn create_item_returns_created() {
        let response = memory_router()
            .oneshot(request(
                "POST",
                "/items",
                Some(serde_json::json!({"name": "Item1", "description": "desc"})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"id": 1, "name": "Item1", "description": "desc"})
        );
    }

    #[tokio::test]
    async fn create_item_without_name_is_bad_request() {
        let response = memory_router()
            .oneshot(request(
                "POST",
                "/items",
                Some(serde_json::json!({"description": "desc"})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn non_numeric_id_is_not_found() {
        let response = memory_router()
            .oneshot(request("GET", "/items/abc", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Item not found");
    }

    #[tokio::test]
    async fn backend_failure_is_internal_error_without_detail() {
        let mut storage = MockStorage::new();
        storage
            .expect_list_items()
            .returning(|| Err(StorageError::Backend("disk I/O error at /var/db".to_string())));

        let app = create_router(AppState::new(Arc::new(storage), "1.0.0-test"));
        let response = app.oneshot(request("GET", "/items", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: HttpErrorResponse = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(body.error, BACKEND_FAILURE_MESSAGE);
        assert_eq!(body.code, "BACKEND_UNAVAILABLE");
    }

    #[tokio::test]
    async fn create_failure_is_internal_error() {
        let mut storage = MockStorage::new();
        storage
            .expect_create_item()
            .times(1)
            .returning(|_| Err(StorageError::Backend("connection refused".to_string())));

        let app = create_router(AppState::new(Arc::new(storage), "1.0.0-test"));
        let response = app
            .oneshot(request(
                "POST",
                "/items",
                Some(serde_json::json!({"name": "Item1"})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(!body.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn metrics_unavailable_without_recorder() {
        if get_metrics_handle().is_some() {
            return;
        }

        let response = memory_router()
            .oneshot(request("GET", "/metrics", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
