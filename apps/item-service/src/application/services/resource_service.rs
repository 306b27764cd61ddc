//! Resource Service
//!
//! The four item CRUD operations plus registration and login. Holds no
//! state of its own: every read and write goes through the injected
//! [`StoragePort`], so several services over separate stores never interfere.

use std::sync::Arc;

use crate::application::dto::{
    CreateItemDto, LoginDto, LoginResultDto, RegisterUserDto, RegisteredUserDto, UpdateItemDto,
};
use crate::application::ports::StoragePort;
use crate::domain::{Item, ItemId, ItemPatch, NewItem, NewUser, StorageError};
use crate::error::ServiceError;
use crate::infrastructure::metrics::record_operation;

/// Message for unknown or unparseable item ids.
pub const ITEM_NOT_FOUND_MESSAGE: &str = "Item not found";

const CREDENTIALS_REQUIRED_MESSAGE: &str = "Username and password are required";
const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials";
const LOGIN_SUCCESS_MESSAGE: &str = "Login successful";

/// Item and user operations over a storage port.
pub struct ResourceService<S>
where
    S: StoragePort + ?Sized,
{
    storage: Arc<S>,
}

impl<S> Clone for ResourceService<S>
where
    S: StoragePort + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<S> ResourceService<S>
where
    S: StoragePort + ?Sized,
{
    /// Create a new `ResourceService`.
    pub const fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Get the underlying storage.
    pub const fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Parse an item id path segment.
    ///
    /// Segments that are not integers match no stored item.
    pub fn parse_item_id(segment: &str) -> Result<ItemId, ServiceError> {
        ItemId::parse_path(segment).ok_or_else(|| ServiceError::not_found(ITEM_NOT_FOUND_MESSAGE))
    }

    /// Register a new user.
    pub async fn register(
        &self,
        request: RegisterUserDto,
    ) -> Result<RegisteredUserDto, ServiceError> {
        let result = self.register_user(request).await;
        observe("register", &result);
        result
    }

    /// Confirm a username/password pair. Issues no session or token.
    pub async fn login(&self, request: LoginDto) -> Result<LoginResultDto, ServiceError> {
        let result = self.check_credentials(request).await;
        observe("login", &result);
        result
    }

    /// Create an item.
    pub async fn create_item(&self, request: CreateItemDto) -> Result<Item, ServiceError> {
        let result = self.insert_item(request).await;
        observe("create_item", &result);
        result
    }

    /// List all items in insertion order.
    pub async fn list_items(&self) -> Result<Vec<Item>, ServiceError> {
        let result = self.storage.list_items().await.map_err(ServiceError::from);
        observe("list_items", &result);
        result
    }

    /// Fetch one item.
    pub async fn get_item(&self, id: ItemId) -> Result<Item, ServiceError> {
        let result = self.storage.get_item(id).await.map_err(item_error);
        observe("get_item", &result);
        result
    }

    /// Apply the supplied fields to an item.
    ///
    /// An update with no fields leaves the item unchanged and still succeeds.
    pub async fn update_item(
        &self,
        id: ItemId,
        request: UpdateItemDto,
    ) -> Result<Item, ServiceError> {
        let patch = ItemPatch::from(request);
        let result = self.storage.update_item(id, patch).await.map_err(item_error);
        if result.is_ok() {
            tracing::info!(item_id = %id, "Item updated");
        }
        observe("update_item", &result);
        result
    }

    /// Delete an item, returning its last stored value.
    pub async fn delete_item(&self, id: ItemId) -> Result<Item, ServiceError> {
        let result = self.storage.delete_item(id).await.map_err(item_error);
        if result.is_ok() {
            tracing::info!(item_id = %id, "Item deleted");
        }
        observe("delete_item", &result);
        result
    }

    async fn insert_item(&self, request: CreateItemDto) -> Result<Item, ServiceError> {
        let name =
            required(request.name).ok_or_else(|| ServiceError::validation("Name is required"))?;

        let item = self
            .storage
            .create_item(NewItem {
                name,
                description: request.description,
            })
            .await?;

        tracing::info!(item_id = %item.id, "Item created");
        Ok(item)
    }

    async fn register_user(
        &self,
        request: RegisterUserDto,
    ) -> Result<RegisteredUserDto, ServiceError> {
        let (Some(username), Some(password)) =
            (required(request.username), required(request.password))
        else {
            return Err(ServiceError::validation(CREDENTIALS_REQUIRED_MESSAGE));
        };

        match self
            .storage
            .create_user(NewUser { username, password })
            .await
        {
            Ok(user) => {
                tracing::info!(user_id = %user.id, username = %user.username, "User registered");
                Ok(RegisteredUserDto::from_user(&user))
            }
            Err(StorageError::AlreadyExists) => {
                Err(ServiceError::conflict("Username already exists"))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn check_credentials(&self, request: LoginDto) -> Result<LoginResultDto, ServiceError> {
        let (Some(username), Some(password)) =
            (required(request.username), required(request.password))
        else {
            return Err(ServiceError::validation(CREDENTIALS_REQUIRED_MESSAGE));
        };

        // Unknown user and wrong password are indistinguishable to the caller.
        let user = match self.storage.find_user_by_username(&username).await {
            Ok(user) => user,
            Err(StorageError::NotFound) => {
                return Err(ServiceError::unauthorized(INVALID_CREDENTIALS_MESSAGE));
            }
            Err(e) => return Err(e.into()),
        };

        if !user.password_matches(&password) {
            tracing::debug!(username = %username, "Password mismatch");
            return Err(ServiceError::unauthorized(INVALID_CREDENTIALS_MESSAGE));
        }

        Ok(LoginResultDto {
            message: LOGIN_SUCCESS_MESSAGE.to_string(),
        })
    }
}

/// A required string is missing when absent or empty.
fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn item_error(err: StorageError) -> ServiceError {
    match err {
        StorageError::NotFound => ServiceError::not_found(ITEM_NOT_FOUND_MESSAGE),
        other => other.into(),
    }
}

fn observe<T>(operation: &'static str, result: &Result<T, ServiceError>) {
    match result {
        Ok(_) => record_operation(operation, "ok"),
        Err(e) => {
            tracing::debug!(operation, error = %e, "Operation failed");
            record_operation(operation, e.code().reason());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::infrastructure::persistence::InMemoryStorage;

    fn service() -> ResourceService<InMemoryStorage> {
        ResourceService::new(Arc::new(InMemoryStorage::new()))
    }

    fn register_dto(username: &str, password: &str) -> RegisterUserDto {
        RegisterUserDto {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        }
    }

    fn login_dto(username: &str, password: &str) -> LoginDto {
        LoginDto {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        }
    }

    fn create_dto(name: &str, description: Option<&str>) -> CreateItemDto {
        CreateItemDto {
            name: Some(name.to_string()),
            description: description.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn register_returns_id_and_username() {
        let service = service();

        let user = service
            .register(register_dto("user1", "secret"))
            .await
            .unwrap();

        assert_eq!(user.id.as_str(), "1");
        assert_eq!(user.username, "user1");
    }

    #[tokio::test]
    async fn register_requires_both_fields() {
        let service = service();

        for request in [
            RegisterUserDto::default(),
            RegisterUserDto {
                username: Some("user1".to_string()),
                password: None,
            },
            register_dto("", "secret"),
            register_dto("user1", ""),
        ] {
            let err = service.register(request).await.unwrap_err();
            assert_eq!(err.code(), ErrorCode::ValidationError);
        }
    }

    #[tokio::test]
    async fn register_duplicate_is_conflict() {
        let service = service();
        service
            .register(register_dto("user1", "secret"))
            .await
            .unwrap();

        let err = service
            .register(register_dto("user1", "other"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn login_outcomes() {
        let service = service();
        service
            .register(register_dto("user1", "secret"))
            .await
            .unwrap();

        let ok = service.login(login_dto("user1", "secret")).await.unwrap();
        assert_eq!(ok.message, "Login successful");

        let wrong = service
            .login(login_dto("user1", "wrong"))
            .await
            .unwrap_err();
        assert_eq!(wrong.code(), ErrorCode::Unauthorized);

        let unknown = service
            .login(login_dto("nobody", "secret"))
            .await
            .unwrap_err();
        assert_eq!(unknown.code(), ErrorCode::Unauthorized);
        assert_eq!(unknown.message(), wrong.message());

        let missing = service.login(LoginDto::default()).await.unwrap_err();
        assert_eq!(missing.code(), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn create_item_requires_name() {
        let service = service();

        let err = service
            .create_item(CreateItemDto::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = service
            .create_item(create_dto("", Some("desc")))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn item_round_trip() {
        let service = service();

        let created = service
            .create_item(create_dto("Item1", Some("desc")))
            .await
            .unwrap();
        let fetched = service.get_item(created.id).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.name, "Item1");
        assert_eq!(fetched.description.as_deref(), Some("desc"));
    }

    #[tokio::test]
    async fn absent_description_stays_absent() {
        let service = service();

        let created = service.create_item(create_dto("Item1", None)).await.unwrap();
        let fetched = service.get_item(created.id).await.unwrap();

        assert_eq!(fetched.description, None);
    }

    #[tokio::test]
    async fn update_and_delete_lifecycle() {
        let service = service();
        let created = service
            .create_item(create_dto("Item1", Some("desc")))
            .await
            .unwrap();

        let updated = service
            .update_item(
                created.id,
                UpdateItemDto {
                    name: Some("Updated".to_string()),
                    description: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Updated");
        assert_eq!(updated.description.as_deref(), Some("desc"));

        let unchanged = service
            .update_item(created.id, UpdateItemDto::default())
            .await
            .unwrap();
        assert_eq!(unchanged, updated);

        let deleted = service.delete_item(created.id).await.unwrap();
        assert_eq!(deleted, updated);

        let err = service.get_item(created.id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
        let err = service.delete_item(created.id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let service = service();
        let id = ItemId::new(99);

        assert_eq!(
            service.get_item(id).await.unwrap_err().code(),
            ErrorCode::NotFound
        );
        assert_eq!(
            service
                .update_item(id, UpdateItemDto::default())
                .await
                .unwrap_err()
                .code(),
            ErrorCode::NotFound
        );
        assert_eq!(
            service.delete_item(id).await.unwrap_err().code(),
            ErrorCode::NotFound
        );
    }

    #[test]
    fn parse_item_id_non_numeric_is_not_found() {
        let err = ResourceService::<InMemoryStorage>::parse_item_id("abc").unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(
            ResourceService::<InMemoryStorage>::parse_item_id("7").unwrap(),
            ItemId::new(7)
        );
    }

    #[tokio::test]
    async fn list_items_empty_is_ok() {
        assert!(service().list_items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn services_over_separate_stores_do_not_interfere() {
        let first = service();
        let second = service();

        first.create_item(create_dto("a", None)).await.unwrap();

        assert_eq!(first.list_items().await.unwrap().len(), 1);
        assert!(second.list_items().await.unwrap().is_empty());
    }
}
