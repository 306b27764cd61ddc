//! Document storage adapter backed by Fjall keyspaces.
//!
//! Records are stored as JSON documents:
//!
//! | Keyspace | Key | Document |
//! |----------|-----|----------|
//! | `items` | big-endian item id | [`Item`] |
//! | `users` | username | [`User`] with a UUID id |
//! | `meta` | `items.next_id` | next item id |
//!
//! Item keys are big-endian positive integers, so a keyspace scan returns
//! items in id order, which is insertion order. The keyspaces themselves are
//! the only source of truth for listing and reset.
//!
//! Mutations touching more than one key commit as a single [`fjall::WriteBatch`].
//! An adapter lock serializes sequence bumps and username insert-if-absent.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use fjall::{Database, Keyspace, KeyspaceCreateOptions};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;

use crate::application::ports::StoragePort;
use crate::domain::{Item, ItemId, ItemPatch, NewItem, NewUser, StorageError, User, UserId};

const ITEMS_KEYSPACE: &str = "items";
const USERS_KEYSPACE: &str = "users";
const META_KEYSPACE: &str = "meta";

const ITEM_SEQUENCE_KEY: &[u8] = b"items.next_id";

/// First item id issued by a fresh or reset store.
const INITIAL_ID: i64 = 1;

struct DocumentInner {
    database: Database,
    items: Keyspace,
    users: Keyspace,
    meta: Keyspace,
    write_lock: Mutex<()>,
}

/// Document-store storage adapter.
#[derive(Clone)]
pub struct DocumentStorage {
    inner: Arc<DocumentInner>,
}

impl std::fmt::Debug for DocumentStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStorage").finish_non_exhaustive()
    }
}

impl DocumentStorage {
    /// Open (or create) a document store at the given directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let started_at = Instant::now();

        let database = Database::builder(path)
            .open()
            .map_err(StorageError::backend)?;
        let open = |name: &str| {
            database
                .keyspace(name, || KeyspaceCreateOptions::default())
                .map_err(StorageError::backend)
        };
        let items = open(ITEMS_KEYSPACE)?;
        let users = open(USERS_KEYSPACE)?;
        let meta = open(META_KEYSPACE)?;

        tracing::info!(
            path = %path.display(),
            duration_ms = started_at.elapsed().as_millis(),
            "Document storage opened"
        );

        Ok(Self {
            inner: Arc::new(DocumentInner {
                database,
                items,
                users,
                meta,
                write_lock: Mutex::new(()),
            }),
        })
    }

    async fn run<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&DocumentInner) -> Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(&inner)).await?
    }
}

fn item_key(id: ItemId) -> [u8; 8] {
    id.get().to_be_bytes()
}

fn id_from_key(key: &[u8]) -> Result<ItemId, StorageError> {
    let bytes: [u8; 8] = key
        .try_into()
        .map_err(|_| StorageError::backend(format!("malformed item key of {} bytes", key.len())))?;
    Ok(ItemId::new(i64::from_be_bytes(bytes)))
}

fn get_json<T: DeserializeOwned>(keyspace: &Keyspace, key: &[u8]) -> Result<Option<T>, StorageError> {
    let bytes = keyspace
        .get(key)
        .map_err(StorageError::backend)?
        .map(|v| v.to_vec());

    match bytes {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

impl DocumentInner {
    fn load_item(&self, id: ItemId) -> Result<Item, StorageError> {
        get_json(&self.items, &item_key(id))?.ok_or(StorageError::NotFound)
    }

    /// Next id to issue. Never below one past the highest stored key, so a
    /// document written without its sequence bump cannot be overwritten.
    fn next_item_id(&self) -> Result<i64, StorageError> {
        let stored: i64 = get_json(&self.meta, ITEM_SEQUENCE_KEY)?.unwrap_or(INITIAL_ID);
        let after_last = match self.items.iter().next_back() {
            Some(guard) => id_from_key(&guard.key().map_err(StorageError::backend)?)?.get() + 1,
            None => INITIAL_ID,
        };
        Ok(stored.max(after_last))
    }

    fn create_item(&self, item: NewItem) -> Result<Item, StorageError> {
        let _guard = self.write_lock.lock();

        let id = self.next_item_id()?;
        let item = item.into_item(ItemId::new(id));

        let mut batch = self.database.batch();
        batch.insert(&self.meta, ITEM_SEQUENCE_KEY, serde_json::to_vec(&(id + 1))?);
        batch.insert(&self.items, item_key(item.id), serde_json::to_vec(&item)?);
        batch.commit().map_err(StorageError::backend)?;

        Ok(item)
    }

    fn list_items(&self) -> Result<Vec<Item>, StorageError> {
        self.items
            .iter()
            .map(|guard| {
                let value = guard.value().map_err(StorageError::backend)?;
                Ok(serde_json::from_slice(&value)?)
            })
            .collect()
    }

    fn update_item(&self, id: ItemId, patch: &ItemPatch) -> Result<Item, StorageError> {
        let _guard = self.write_lock.lock();
        let mut item = self.load_item(id)?;
        if !patch.is_empty() {
            patch.apply_to(&mut item);
            self.items
                .insert(item_key(id), serde_json::to_vec(&item)?)
                .map_err(StorageError::backend)?;
        }
        Ok(item)
    }

    fn delete_item(&self, id: ItemId) -> Result<Item, StorageError> {
        let _guard = self.write_lock.lock();
        let item = self.load_item(id)?;
        self.items
            .remove(item_key(id))
            .map_err(StorageError::backend)?;
        Ok(item)
    }

    fn create_user(&self, user: NewUser) -> Result<User, StorageError> {
        let _guard = self.write_lock.lock();

        if self
            .users
            .contains_key(user.username.as_bytes())
            .map_err(StorageError::backend)?
        {
            return Err(StorageError::AlreadyExists);
        }

        let user = user.into_user(UserId::generate());
        self.users
            .insert(user.username.as_bytes(), serde_json::to_vec(&user)?)
            .map_err(StorageError::backend)?;
        Ok(user)
    }

    fn find_user(&self, username: &str) -> Result<User, StorageError> {
        get_json(&self.users, username.as_bytes())?.ok_or(StorageError::NotFound)
    }

    fn reset(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();

        let mut batch = self.database.batch();
        for keyspace in [&self.items, &self.users, &self.meta] {
            for guard in keyspace.iter() {
                let key = guard.key().map_err(StorageError::backend)?;
                batch.remove(keyspace, key);
            }
        }
        batch.commit().map_err(StorageError::backend)
    }
}

#[async_trait]
impl StoragePort for DocumentStorage {
    fn backend_name(&self) -> &'static str {
        "document"
    }

    async fn create_item(&self, item: NewItem) -> Result<Item, StorageError> {
        self.run(move |inner| inner.create_item(item)).await
    }

    async fn get_item(&self, id: ItemId) -> Result<Item, StorageError> {
        self.run(move |inner| inner.load_item(id)).await
    }

    async fn list_items(&self) -> Result<Vec<Item>, StorageError> {
        self.run(DocumentInner::list_items).await
    }

    async fn update_item(&self, id: ItemId, patch: ItemPatch) -> Result<Item, StorageError> {
        self.run(move |inner| inner.update_item(id, &patch)).await
    }

    async fn delete_item(&self, id: ItemId) -> Result<Item, StorageError> {
        self.run(move |inner| inner.delete_item(id)).await
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StorageError> {
        self.run(move |inner| inner.create_user(user)).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<User, StorageError> {
        let username = username.to_string();
        self.run(move |inner| inner.find_user(&username)).await
    }

    async fn reset(&self) -> Result<(), StorageError> {
        self.run(DocumentInner::reset).await
    }
}
