//! Relational storage adapter backed by SQLite.
//!
//! # Invariants
//! - `AUTOINCREMENT` keys: a deleted item id is never issued again, even
//!   across restarts of a file-backed database.
//! - Username uniqueness is enforced by the `UNIQUE` constraint, so the
//!   insert itself is the existence check.
//! - Driver errors are classified here and nowhere else.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::application::ports::StoragePort;
use crate::domain::{Item, ItemId, ItemPatch, NewItem, NewUser, StorageError, User, UserId};

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT
);
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL
);";

const RESET_SQL: &str = "
DELETE FROM items;
DELETE FROM users;
DELETE FROM sqlite_sequence WHERE name IN ('items', 'users');";

const ITEM_SELECT_SQL: &str = "SELECT id, name, description FROM items";
const USER_SELECT_SQL: &str = "SELECT id, username, password FROM users";

/// SQLite storage adapter.
///
/// The connection sits behind a mutex and every call runs on the blocking
/// thread pool, so statements never interleave.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Open (or create) a database file and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let started_at = Instant::now();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(StorageError::backend)?;
        }

        let conn = Connection::open(path).map_err(classify)?;
        let storage = Self::bootstrap(conn)?;

        tracing::info!(
            path = %path.display(),
            duration_ms = started_at.elapsed().as_millis(),
            "SQLite storage opened"
        );
        Ok(storage)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(classify)?;
        Self::bootstrap(conn)
    }

    fn bootstrap(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(SCHEMA_SQL).map_err(classify)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock();
            f(&mut conn)
        })
        .await?
    }
}

/// Map a driver error onto the storage taxonomy.
fn classify(err: rusqlite::Error) -> StorageError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => StorageError::NotFound,
        rusqlite::Error::SqliteFailure(ref failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            StorageError::AlreadyExists
        }
        other => StorageError::backend(other),
    }
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: ItemId::new(row.get(0)?),
        name: row.get(1)?,
        description: row.get(2)?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId::from_sequence(row.get(0)?),
        username: row.get(1)?,
        password: row.get(2)?,
    })
}

fn select_item(conn: &Connection, id: ItemId) -> Result<Item, StorageError> {
    conn.query_row(
        &format!("{ITEM_SELECT_SQL} WHERE id = ?1"),
        params![id.get()],
        item_from_row,
    )
    .map_err(classify)
}

#[async_trait]
impl StoragePort for SqliteStorage {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn create_item(&self, item: NewItem) -> Result<Item, StorageError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO items (name, description) VALUES (?1, ?2)",
                params![item.name, item.description],
            )
            .map_err(classify)?;

            let id = ItemId::new(conn.last_insert_rowid());
            Ok(item.into_item(id))
        })
        .await
    }

    async fn get_item(&self, id: ItemId) -> Result<Item, StorageError> {
        self.with_conn(move |conn| select_item(conn, id)).await
    }

    async fn list_items(&self) -> Result<Vec<Item>, StorageError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!("{ITEM_SELECT_SQL} ORDER BY id"))
                .map_err(classify)?;
            let items = stmt
                .query_map([], item_from_row)
                .map_err(classify)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(classify)?;
            Ok(items)
        })
        .await
    }

    async fn update_item(&self, id: ItemId, patch: ItemPatch) -> Result<Item, StorageError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction().map_err(classify)?;
            let changed = tx
                .execute(
                    "UPDATE items
                     SET name = COALESCE(?1, name),
                         description = COALESCE(?2, description)
                     WHERE id = ?3",
                    params![patch.name, patch.description, id.get()],
                )
                .map_err(classify)?;

            if changed == 0 {
                return Err(StorageError::NotFound);
            }

            let item = select_item(&tx, id)?;
            tx.commit().map_err(classify)?;
            Ok(item)
        })
        .await
    }

    async fn delete_item(&self, id: ItemId) -> Result<Item, StorageError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction().map_err(classify)?;
            let item = select_item(&tx, id)?;
            tx.execute("DELETE FROM items WHERE id = ?1", params![id.get()])
                .map_err(classify)?;
            tx.commit().map_err(classify)?;
            Ok(item)
        })
        .await
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StorageError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO users (username, password) VALUES (?1, ?2)",
                params![user.username, user.password],
            )
            .map_err(classify)?;

            let id = UserId::from_sequence(conn.last_insert_rowid());
            Ok(user.into_user(id))
        })
        .await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<User, StorageError> {
        let username = username.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("{USER_SELECT_SQL} WHERE username = ?1"),
                params![username],
                user_from_row,
            )
            .optional()
            .map_err(classify)?
            .ok_or(StorageError::NotFound)
        })
        .await
    }

    async fn reset(&self) -> Result<(), StorageError> {
        self.with_conn(|conn| conn.execute_batch(RESET_SQL).map_err(classify))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn new_item(name: &str) -> NewItem {
        NewItem {
            name: name.to_string(),
            description: Some(format!("{name} description")),
        }
    }

    #[test]
    fn unique_violation_classifies_as_already_exists() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();
        conn.execute(
            "INSERT INTO users (username, password) VALUES ('a', 'b')",
            [],
        )
        .unwrap();

        let err = conn
            .execute(
                "INSERT INTO users (username, password) VALUES ('a', 'c')",
                [],
            )
            .unwrap_err();

        assert_eq!(classify(err), StorageError::AlreadyExists);
    }

    #[test]
    fn other_driver_errors_classify_as_backend() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn.execute("SELECT * FROM missing_table", []).unwrap_err();

        assert!(matches!(classify(err), StorageError::Backend(_)));
    }

    #[tokio::test]
    async fn ids_survive_reopen_without_reuse() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("items.db");

        {
            let store = SqliteStorage::open(&path).unwrap();
            store.create_item(new_item("a")).await.unwrap();
            let second = store.create_item(new_item("b")).await.unwrap();
            store.delete_item(second.id).await.unwrap();
        }

        let store = SqliteStorage::open(&path).unwrap();
        let third = store.create_item(new_item("c")).await.unwrap();
        assert_eq!(third.id, ItemId::new(3));

        let names: Vec<_> = store
            .list_items()
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.name)
            .collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn open_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("items.db");

        SqliteStorage::open(&path).unwrap();

        assert!(path.exists());
    }

    #[tokio::test]
    async fn reset_restarts_sequences() {
        let store = SqliteStorage::open_in_memory().unwrap();
        store.create_item(new_item("a")).await.unwrap();
        store.create_item(new_item("b")).await.unwrap();

        store.reset().await.unwrap();

        let item = store.create_item(new_item("c")).await.unwrap();
        assert_eq!(item.id, ItemId::new(1));
    }
}
