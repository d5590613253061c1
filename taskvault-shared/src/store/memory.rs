//! In-memory store
//!
//! Implements both store traits over `RwLock`ed hash maps with the same
//! observable behavior as the PostgreSQL store: unique username and email,
//! case-normalized lookups, overwrite semantics for the refresh token slot,
//! and the shared query rules from [`crate::tasks::query`].

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{CredentialStore, StoreError, TaskStore};
use crate::models::user::normalize_identifier;
use crate::models::{CreateUser, Task, TaskId, UpdateUser, User, UserId};
use crate::tasks::query::{run_in_memory, ScoredTask, TaskQueryPlan};

/// Process-local store for users and tasks
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    tasks: RwLock<HashMap<TaskId, Task>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    /// Number of stored tasks
    pub async fn task_count(&self) -> usize {
        self.tasks.read().await.len()
    }
}

/// Name of the first unique field of `candidate` already held by another user
fn taken_field(
    users: &HashMap<UserId, User>,
    except: Option<UserId>,
    username: Option<&str>,
    email: Option<&str>,
) -> Option<&'static str> {
    let others = || users.values().filter(move |u| Some(u.id) != except);

    if let Some(username) = username {
        if others().any(|u| u.username == username) {
            return Some("username");
        }
    }
    if let Some(email) = email {
        if others().any(|u| u.email == email) {
            return Some("email");
        }
    }
    None
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn create(&self, user: CreateUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;

        let username = normalize_identifier(&user.username);
        let email = normalize_identifier(&user.email);

        if let Some(field) = taken_field(&users, None, Some(&username), Some(&email)) {
            return Err(StoreError::Duplicate(field.to_string()));
        }

        let now = Utc::now();
        let record = User {
            id: UserId::new(),
            username,
            email,
            password_hash: user.password_hash,
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        };

        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        let username = username.map(normalize_identifier);
        let email = email.map(normalize_identifier);

        if username.is_none() && email.is_none() {
            return Ok(None);
        }

        let users = self.users.read().await;
        let found = users.values().find(|u| {
            username.as_deref() == Some(u.username.as_str())
                || email.as_deref() == Some(u.email.as_str())
        });

        Ok(found.cloned())
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: UpdateUser,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;

        let username = update.username.as_deref().map(normalize_identifier);
        let email = update.email.as_deref().map(normalize_identifier);

        if let Some(field) = taken_field(&users, Some(id), username.as_deref(), email.as_deref()) {
            return Err(StoreError::Duplicate(field.to_string()));
        }

        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(username) = username {
            user.username = username;
        }
        if let Some(email) = email {
            user.email = email;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn set_password_hash(
        &self,
        id: UserId,
        password_hash: String,
    ) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                user.password_hash = password_hash;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_refresh_token(
        &self,
        id: UserId,
        refresh_token_hash: Option<String>,
    ) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                user.refresh_token_hash = refresh_token_hash;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        // tasks are left in place; ownership is not cascaded
        Ok(self.users.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert(&self, task: Task) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.id) {
            return Err(StoreError::Duplicate("id".to_string()));
        }
        tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn update(&self, task: &Task) -> Result<Option<Task>, StoreError> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&task.id) {
            Some(stored) => {
                stored.title = task.title.clone();
                stored.description = task.description.clone();
                stored.status = task.status;
                stored.due_date = task.due_date;
                stored.version = task.version;
                stored.updated_at = task.updated_at;
                Ok(Some(stored.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.write().await.remove(&id))
    }

    async fn find_page(&self, plan: &TaskQueryPlan) -> Result<(Vec<ScoredTask>, u64), StoreError> {
        let tasks = self.tasks.read().await;
        Ok(run_in_memory(tasks.values(), plan))
    }
}
