//! Domain layer.
//!
//! Item and user records, their identifiers, the partial-update merge rule,
//! and the storage error classification every adapter reports through.

pub mod errors;
pub mod item;
pub mod user;

pub use errors::StorageError;
pub use item::{Item, ItemId, ItemPatch, NewItem};
pub use user::{NewUser, User, UserId};
