//! User model
//!
//! A user owns a credential hash and a single session slot holding the
//! digest of the currently valid refresh token. Neither ever leaves the
//! service: callers only see [`PublicUser`].
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id UUID PRIMARY KEY,
//!     username TEXT NOT NULL UNIQUE,
//!     email TEXT NOT NULL UNIQUE,
//!     password_hash TEXT NOT NULL,
//!     refresh_token_hash CHAR(64),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::UserId;

/// Stored user record
///
/// Deliberately not `Serialize`: the credential hash and the refresh token
/// digest must never be written to a response.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    /// User id
    pub id: UserId,

    /// Unique username (trimmed, lowercase)
    pub username: String,

    /// Unique email (trimmed, lowercase)
    pub email: String,

    /// Argon2id PHC string
    pub password_hash: String,

    /// SHA-256 digest of the current refresh token, if a session is open
    pub refresh_token_hash: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last modified
    pub updated_at: DateTime<Utc>,
}

/// User projection safe to return to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: UserId,
    pub user_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Strips the credential hash and the session slot
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            user_name: self.username.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser {
            id: user.id,
            user_name: user.username,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Input for creating a user
///
/// Carries the already computed hash, never the plaintext password.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Profile fields to change; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
}

impl UpdateUser {
    /// True when nothing would change
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none()
    }
}

/// Canonical form of a username or email: trimmed and lowercased
pub fn normalize_identifier(value: &str) -> String {
    value.trim().to_lowercase()
}
