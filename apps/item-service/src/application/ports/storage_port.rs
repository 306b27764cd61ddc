//! Storage Port (Driven Port)
//!
//! Persistence interface for items and users. Implemented once per backend
//! in `infrastructure::persistence`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Item, ItemId, ItemPatch, NewItem, NewUser, StorageError, User};

/// Port for item and user persistence.
///
/// Every operation is a single logical step against the backend. Adapters
/// report failures only through [`StorageError`].
#[async_trait]
pub trait StoragePort: Send + Sync {
    /// Short backend label used in logs and the health endpoint.
    fn backend_name(&self) -> &'static str;

    /// Assign the next item id, persist the item and return the stored record.
    async fn create_item(&self, item: NewItem) -> Result<Item, StorageError>;

    /// Fetch an item by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for unknown ids.
    async fn get_item(&self, id: ItemId) -> Result<Item, StorageError>;

    /// Snapshot of all items in insertion order.
    async fn list_items(&self) -> Result<Vec<Item>, StorageError>;

    /// Apply the present fields of `patch` and return the updated item.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for unknown ids.
    async fn update_item(&self, id: ItemId, patch: ItemPatch) -> Result<Item, StorageError>;

    /// Remove an item and return its last stored value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for unknown ids.
    async fn delete_item(&self, id: ItemId) -> Result<Item, StorageError>;

    /// Insert a user if the username is not taken.
    ///
    /// The uniqueness check and the insert are one atomic operation.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if the username is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, StorageError>;

    /// Look up a user by username.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for unknown usernames.
    async fn find_user_by_username(&self, username: &str) -> Result<User, StorageError>;

    /// Remove all items and users and restart both id sequences.
    ///
    /// Test isolation only; not reachable from the request path.
    async fn reset(&self) -> Result<(), StorageError>;
}

/// Shared, type-erased storage handle.
pub type SharedStorage = Arc<dyn StoragePort>;
