//! Task operations
//!
//! Listing is always scoped to the caller. Updates and deletes require the
//! caller to own the task. Reading a single task by id does not check
//! ownership: any authenticated user may fetch any task they know the id of.

use std::sync::Arc;

use tracing::debug;

use super::query::{ListTasksParams, Page, TaskQueryPlan};
use crate::auth::authorization::require_task_owner;
use crate::error::{CoreError, CoreResult};
use crate::models::{NewTask, Task, TaskChanges, TaskId, TaskView, UserId};
use crate::store::TaskStore;

/// Task operations over a [`TaskStore`]
#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
}

impl std::fmt::Debug for TaskService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskService").finish_non_exhaustive()
    }
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskStore>) -> Self {
        Self { tasks }
    }

    /// Lists the owner's tasks
    pub async fn list_tasks(
        &self,
        owner: UserId,
        params: ListTasksParams,
    ) -> CoreResult<Page<TaskView>> {
        let plan = TaskQueryPlan::build(owner, params)?;
        let (rows, total) = self.tasks.find_page(&plan).await?;

        let docs = rows
            .iter()
            .map(|row| TaskView::new(&row.task, row.score))
            .collect();

        Ok(Page::new(docs, total, plan.page, plan.limit))
    }

    /// Fetches any task by id
    pub async fn get_task_by_id(&self, task_id: TaskId) -> CoreResult<TaskView> {
        self.tasks
            .find_by_id(task_id)
            .await?
            .map(|task| task.to_view())
            .ok_or_else(|| CoreError::NotFound("Failed To Fetch The Task!".to_string()))
    }

    /// Creates a task owned by `owner`
    pub async fn create_task(&self, owner: UserId, input: NewTask) -> CoreResult<TaskView> {
        if input.title.trim().is_empty() {
            return Err(CoreError::InvalidInput("Title Is Required!".to_string()));
        }

        let task = self.tasks.insert(Task::create(owner, input)).await?;

        debug!(task_id = %task.id, owner_id = %owner, "Task created");
        Ok(task.to_view())
    }

    /// Applies changes to a task the subject owns
    pub async fn update_task(
        &self,
        subject: UserId,
        task_id: TaskId,
        changes: TaskChanges,
    ) -> CoreResult<TaskView> {
        if changes.is_empty() {
            return Err(CoreError::InvalidInput(
                "At Least One Field Is Required!".to_string(),
            ));
        }

        if changes.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(CoreError::InvalidInput("Title Is Required!".to_string()));
        }

        let mut task = require_task_owner(self.tasks.as_ref(), subject, task_id).await?;
        task.apply(changes);

        let updated = self
            .tasks
            .update(&task)
            .await?
            .ok_or_else(|| CoreError::Internal("Failed To Update Task!".to_string()))?;

        Ok(updated.to_view())
    }

    /// Deletes a task the subject owns, returning it
    pub async fn delete_task(&self, subject: UserId, task_id: TaskId) -> CoreResult<TaskView> {
        require_task_owner(self.tasks.as_ref(), subject, task_id).await?;

        let deleted = self
            .tasks
            .delete(task_id)
            .await?
            .ok_or_else(|| CoreError::InvalidInput("Failed To Delete Task!".to_string()))?;

        debug!(task_id = %task_id, "Task deleted");
        Ok(deleted.to_view())
    }
}
