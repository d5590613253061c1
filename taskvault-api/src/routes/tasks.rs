/// Task endpoints
///
/// Every route requires an authenticated session. Tasks are always created
/// for the caller; updates and deletes are limited to the task's owner.
///
/// # Endpoints
///
/// - `GET  /api/v1/task/getAllTasks` - List, search and page the caller's tasks
/// - `GET  /api/v1/task/getTaskById?taskId=` - Fetch one task
/// - `POST /api/v1/task/createTask` - Create a task
/// - `POST /api/v1/task/updateTask?taskId=` - Change a task
/// - `GET  /api/v1/task/deleteTask?taskId=` - Delete a task

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ValidatedJson, ValidatedQuery},
    response::ApiResponse,
};
use axum::{extract::State, Extension};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskvault_shared::{
    auth::middleware::AuthContext,
    models::{NewTask, TaskChanges, TaskId, TaskStatus, TaskView},
    tasks::{ListTasksParams, Page, SortDirection, SortField},
};
use validator::{Validate, ValidationError};

/// Listing query
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListTasksQuery {
    #[validate(length(min = 3, max = 50, message = "Search must be 3-50 characters"))]
    pub search: Option<String>,

    pub status: Option<TaskStatus>,

    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<u64>,

    #[validate(range(min = 1, message = "Limit must be at least 1"))]
    pub limit: Option<u64>,

    pub sort_by: Option<SortField>,

    pub sort_type: Option<SortDirection>,
}

impl From<ListTasksQuery> for ListTasksParams {
    fn from(query: ListTasksQuery) -> Self {
        Self {
            search: query.search,
            status: query.status,
            page: query.page,
            limit: query.limit,
            sort_by: query.sort_by,
            sort_type: query.sort_type,
        }
    }
}

/// `?taskId=<uuid>`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskIdQuery {
    pub task_id: TaskId,
}

/// Create task request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 50, message = "Title must be 1-50 characters"))]
    pub title: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    pub due_date: DateTime<Utc>,
}

/// Update task request; at least one field
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[validate(schema(function = "update_has_field"))]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 50, message = "Title must be 1-50 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    pub due_date: Option<DateTime<Utc>>,
}

fn update_has_field(req: &UpdateTaskRequest) -> Result<(), ValidationError> {
    if req.title.is_none()
        && req.description.is_none()
        && req.status.is_none()
        && req.due_date.is_none()
    {
        let mut err = ValidationError::new("required");
        err.message = Some("At least one field is required".into());
        return Err(err);
    }
    Ok(())
}

/// List the caller's tasks
///
/// Searching adds a relevance `score` to each task and orders by it first.
pub async fn get_all_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedQuery(query): ValidatedQuery<ListTasksQuery>,
) -> ApiResult<ApiResponse<Page<TaskView>>> {
    let page = state.tasks.list_tasks(auth.user_id(), query.into()).await?;

    Ok(ApiResponse::ok("OK", page))
}

/// Fetch a task by id
///
/// Any authenticated user may read any task.
///
/// # Errors
///
/// - `404 Not Found`: No such task
pub async fn get_task_by_id(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<TaskIdQuery>,
) -> ApiResult<ApiResponse<TaskView>> {
    let task = state.tasks.get_task_by_id(query.task_id).await?;

    Ok(ApiResponse::ok("Task Fetched Successfully!", task))
}

/// Create a task owned by the caller
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<CreateTaskRequest>,
) -> ApiResult<ApiResponse<TaskView>> {
    let task = state
        .tasks
        .create_task(
            auth.user_id(),
            NewTask {
                title: req.title,
                description: req.description,
                status: req.status,
                due_date: req.due_date,
            },
        )
        .await?;

    Ok(ApiResponse::created("Task Created Successfully!", task))
}

/// Change a task the caller owns
///
/// # Errors
///
/// - `400 Bad Request`: Unknown task id or no change given
/// - `403 Forbidden`: Caller does not own the task
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedQuery(query): ValidatedQuery<TaskIdQuery>,
    ValidatedJson(req): ValidatedJson<UpdateTaskRequest>,
) -> ApiResult<ApiResponse<TaskView>> {
    let task = state
        .tasks
        .update_task(
            auth.user_id(),
            query.task_id,
            TaskChanges {
                title: req.title,
                description: req.description,
                status: req.status,
                due_date: req.due_date,
            },
        )
        .await?;

    Ok(ApiResponse::ok("Task Updated Successfully!", task))
}

/// Delete a task the caller owns
///
/// # Errors
///
/// - `400 Bad Request`: Unknown task id
/// - `403 Forbidden`: Caller does not own the task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedQuery(query): ValidatedQuery<TaskIdQuery>,
) -> ApiResult<ApiResponse<TaskView>> {
    let task = state.tasks.delete_task(auth.user_id(), query.task_id).await?;

    Ok(ApiResponse::ok("Task Deleted Successfully!", task))
}
