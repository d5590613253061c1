//! Ownership checks for task mutation
//!
//! Updating or deleting a task requires the authenticated user to be its
//! owner. Ids are compared as values ([`UserId`] equality), so the outcome
//! does not depend on how either id was loaded or serialized.
//!
//! # Example
//!
//! ```no_run
//! use taskvault_shared::auth::authorization::require_task_owner;
//! use taskvault_shared::models::{TaskId, UserId};
//! use taskvault_shared::store::TaskStore;
//!
//! async fn rename(tasks: &dyn TaskStore, me: UserId, id: TaskId) -> Result<(), Box<dyn std::error::Error>> {
//!     let task = require_task_owner(tasks, me, id).await?;
//!     println!("{} may edit {}", me, task.title);
//!     Ok(())
//! }
//! ```

use crate::error::CoreError;
use crate::models::{Task, TaskId, UserId};
use crate::store::{StoreError, TaskStore};

/// Error type for ownership checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// The task id does not resolve
    #[error("Task {0} not found")]
    TaskNotFound(TaskId),

    /// The task belongs to someone else
    #[error("Not authorized to modify this task")]
    NotOwner,

    /// Storage failure while loading the task
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<AuthzError> for CoreError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::TaskNotFound(_) => CoreError::InvalidInput("Invalid Task Id!".to_string()),
            AuthzError::NotOwner => CoreError::Forbidden("Not Authorized!".to_string()),
            AuthzError::Store(e) => e.into(),
        }
    }
}

/// Checks that `subject` owns `task`
pub fn ensure_owner(subject: UserId, task: &Task) -> Result<(), AuthzError> {
    if task.owner_id == subject {
        Ok(())
    } else {
        Err(AuthzError::NotOwner)
    }
}

/// Loads a task and checks that `subject` owns it
///
/// # Errors
///
/// - `TaskNotFound` if the id does not resolve
/// - `NotOwner` if the task belongs to another user
pub async fn require_task_owner(
    tasks: &dyn TaskStore,
    subject: UserId,
    task_id: TaskId,
) -> Result<Task, AuthzError> {
    let task = tasks
        .find_by_id(task_id)
        .await?
        .ok_or(AuthzError::TaskNotFound(task_id))?;

    ensure_owner(subject, &task)?;

    Ok(task)
}
