//! User records.
//!
//! Passwords are stored and compared verbatim.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a user.
///
/// Counter-based backends issue decimal strings ("1", "2", ...); the document
/// backend issues UUID v4 strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create an identifier from a numeric sequence value.
    #[must_use]
    pub fn from_sequence(value: i64) -> Self {
        Self(value.to_string())
    }

    /// Generate a new unique identifier using UUID v4.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Unique username.
    pub username: String,
    /// Password as supplied at registration.
    pub password: String,
}

impl User {
    /// Exact comparison against a supplied password.
    #[must_use]
    pub fn password_matches(&self, candidate: &str) -> bool {
        self.password == candidate
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Validated input for registering a user.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Requested username.
    pub username: String,
    /// Password.
    pub password: String,
}

impl NewUser {
    /// Attach an identifier, producing the stored record.
    #[must_use]
    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            username: self.username,
            password: self.password,
        }
    }
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
