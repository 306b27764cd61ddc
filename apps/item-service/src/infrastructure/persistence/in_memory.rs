//! In-memory storage adapter.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::StoragePort;
use crate::domain::{Item, ItemId, ItemPatch, NewItem, NewUser, StorageError, User, UserId};

/// First id issued by a fresh or reset store.
const INITIAL_ID: i64 = 1;

#[derive(Debug)]
struct MemoryState {
    /// Items in insertion order. Ids increase monotonically, so the vector
    /// is also sorted by id.
    items: Vec<Item>,
    next_item_id: i64,
    users: HashMap<String, User>,
    next_user_id: i64,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_item_id: INITIAL_ID,
            users: HashMap::new(),
            next_user_id: INITIAL_ID,
        }
    }
}

impl MemoryState {
    fn position(&self, id: ItemId) -> Option<usize> {
        self.items.binary_search_by_key(&id, |item| item.id).ok()
    }
}

/// Storage adapter holding everything in process memory.
///
/// All mutations take the write lock, which makes id assignment and the
/// username insert-if-absent atomic under concurrent requests.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    state: RwLock<MemoryState>,
}

impl InMemoryStorage {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn item_count(&self) -> usize {
        self.state.read().items.len()
    }

    #[cfg(test)]
    fn user_count(&self) -> usize {
        self.state.read().users.len()
    }
}

#[async_trait]
impl StoragePort for InMemoryStorage {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create_item(&self, item: NewItem) -> Result<Item, StorageError> {
        let mut state = self.state.write();
        let id = ItemId::new(state.next_item_id);
        state.next_item_id += 1;

        let item = item.into_item(id);
        state.items.push(item.clone());
        Ok(item)
    }

    async fn get_item(&self, id: ItemId) -> Result<Item, StorageError> {
        let state = self.state.read();
        state
            .position(id)
            .map(|index| state.items[index].clone())
            .ok_or(StorageError::NotFound)
    }

    async fn list_items(&self) -> Result<Vec<Item>, StorageError> {
        Ok(self.state.read().items.clone())
    }

    async fn update_item(&self, id: ItemId, patch: ItemPatch) -> Result<Item, StorageError> {
        let mut state = self.state.write();
        let index = state.position(id).ok_or(StorageError::NotFound)?;

        let item = &mut state.items[index];
        patch.apply_to(item);
        Ok(item.clone())
    }

    async fn delete_item(&self, id: ItemId) -> Result<Item, StorageError> {
        let mut state = self.state.write();
        let index = state.position(id).ok_or(StorageError::NotFound)?;
        Ok(state.items.remove(index))
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StorageError> {
        let mut state = self.state.write();
        if state.users.contains_key(&user.username) {
            return Err(StorageError::AlreadyExists);
        }

        let id = UserId::from_sequence(state.next_user_id);
        state.next_user_id += 1;

        let user = user.into_user(id);
        state.users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<User, StorageError> {
        self.state
            .read()
            .users
            .get(username)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn reset(&self) -> Result<(), StorageError> {
        *self.state.write() = MemoryState::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn new_item(name: &str) -> NewItem {
        NewItem {
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn counts_track_contents() {
        let store = InMemoryStorage::new();
        assert_eq!(store.item_count(), 0);

        store.create_item(new_item("a")).await.unwrap();
        store
            .create_user(NewUser {
                username: "u".to_string(),
                password: "p".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(store.item_count(), 1);
        assert_eq!(store.user_count(), 1);

        store.reset().await.unwrap();
        assert_eq!(store.item_count(), 0);
        assert_eq!(store.user_count(), 0);
    }

    #[tokio::test]
    async fn lookup_after_middle_delete() {
        let store = InMemoryStorage::new();
        for name in ["a", "b", "c"] {
            store.create_item(new_item(name)).await.unwrap();
        }

        store.delete_item(ItemId::new(2)).await.unwrap();

        assert_eq!(store.get_item(ItemId::new(3)).await.unwrap().name, "c");
        assert_eq!(store.get_item(ItemId::new(1)).await.unwrap().name, "a");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registration_admits_one() {
        let store = Arc::new(InMemoryStorage::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .create_user(NewUser {
                            username: "same".to_string(),
                            password: format!("p{i}"),
                        })
                        .await
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(e) => assert_eq!(e, StorageError::AlreadyExists),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_get_distinct_ids() {
        let store = Arc::new(InMemoryStorage::new());

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.create_item(new_item(&format!("i{i}"))).await })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), 32);
    }
}
