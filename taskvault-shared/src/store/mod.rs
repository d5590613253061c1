//! Storage contracts
//!
//! The services only talk to storage through [`CredentialStore`] and
//! [`TaskStore`]. Two implementations ship with the crate:
//!
//! - [`postgres`]: PostgreSQL through sqlx
//! - [`memory`]: process-local maps, for tests and database-less runs
//!
//! Every method is a single atomic read or write; nothing here spans a
//! transaction.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::{CreateUser, Task, TaskId, UpdateUser, User, UserId};
use crate::tasks::query::{ScoredTask, TaskQueryPlan};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique field already holds this value; carries the field name
    #[error("duplicate value for {0}")]
    Duplicate(String),

    /// Any other storage failure
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let field = match db_err.constraint() {
                    Some(c) if c.contains("email") => "email",
                    Some(c) if c.contains("username") => "username",
                    _ => "record",
                };
                return StoreError::Duplicate(field.to_string());
            }
        }

        StoreError::Database(err.to_string())
    }
}

/// Persistence for user identities, credentials and the refresh token slot
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Inserts a user; `Duplicate` if username or email is taken
    async fn create(&self, user: CreateUser) -> Result<User, StoreError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Finds a user whose username equals `username` OR whose email equals
    /// `email`. Absent identifiers are ignored; both absent finds nothing.
    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, StoreError>;

    /// Changes username and/or email; `None` if the user is gone
    async fn update_profile(&self, id: UserId, update: UpdateUser)
        -> Result<Option<User>, StoreError>;

    /// Replaces the credential hash; `false` if the user is gone
    async fn set_password_hash(&self, id: UserId, password_hash: String)
        -> Result<bool, StoreError>;

    /// Overwrites the refresh token slot; `None` clears it.
    /// Returns `false` if the user is gone.
    async fn set_refresh_token(
        &self,
        id: UserId,
        refresh_token_hash: Option<String>,
    ) -> Result<bool, StoreError>;

    /// Deletes a user; `false` if there was nothing to delete
    async fn delete(&self, id: UserId) -> Result<bool, StoreError>;

    /// Checks that the backing store is reachable
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Persistence for tasks
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert(&self, task: Task) -> Result<Task, StoreError>;

    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, StoreError>;

    /// Writes the mutable fields of `task`; `None` if it no longer exists
    async fn update(&self, task: &Task) -> Result<Option<Task>, StoreError>;

    /// Removes a task and returns it; `None` if it did not exist
    async fn delete(&self, id: TaskId) -> Result<Option<Task>, StoreError>;

    /// Executes a list query, returning one page and the total match count
    async fn find_page(&self, plan: &TaskQueryPlan) -> Result<(Vec<ScoredTask>, u64), StoreError>;
}

/// The pair of stores the services run against
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn CredentialStore>,
    pub tasks: Arc<dyn TaskStore>,
}

impl Storage {
    /// Both stores backed by one in-memory instance
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            tasks: store,
        }
    }

    /// Both stores backed by one PostgreSQL pool
    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(PostgresStore::new(pool));
        Self {
            users: store.clone(),
            tasks: store,
        }
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}
