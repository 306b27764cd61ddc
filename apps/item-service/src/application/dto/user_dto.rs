//! User DTOs.

use serde::{Deserialize, Serialize};

use crate::domain::{User, UserId};

/// Input for registration.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterUserDto {
    /// Requested username.
    #[serde(default)]
    pub username: Option<String>,
    /// Password.
    #[serde(default)]
    pub password: Option<String>,
}

/// Input for login.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginDto {
    /// Username.
    #[serde(default)]
    pub username: Option<String>,
    /// Password.
    #[serde(default)]
    pub password: Option<String>,
}

macro_rules! redacted_debug {
    ($name:ident) => {
        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("username", &self.username)
                    .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
                    .finish()
            }
        }
    };
}

redacted_debug!(RegisterUserDto);
redacted_debug!(LoginDto);

/// A newly registered user. The password is never echoed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredUserDto {
    /// User identifier.
    pub id: UserId,
    /// Username.
    pub username: String,
}

impl RegisteredUserDto {
    /// Project a stored user.
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
        }
    }
}

/// Successful login confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResultDto {
    /// Confirmation message.
    pub message: String,
}
