//! Task model
//!
//! A task belongs to exactly one owner, fixed at creation. Title and
//! description are stored trimmed and lowercased so search and sorting see a
//! single canonical form. `version` counts updates and, like the owner, is
//! never part of the public projection.
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE task_status AS ENUM ('pending', 'in-progress', 'completed');
//!
//! CREATE TABLE tasks (
//!     id UUID PRIMARY KEY,
//!     owner_id UUID NOT NULL,
//!     title TEXT NOT NULL,
//!     description TEXT,
//!     status task_status NOT NULL DEFAULT 'pending',
//!     due_date TIMESTAMPTZ NOT NULL,
//!     version BIGINT NOT NULL DEFAULT 0,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{TaskId, UserId};

/// Task progress status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not started
    #[default]
    #[sqlx(rename = "pending")]
    Pending,

    /// Being worked on
    #[sqlx(rename = "in-progress")]
    InProgress,

    /// Done
    #[sqlx(rename = "completed")]
    Completed,
}

impl TaskStatus {
    /// All statuses, in declaration order
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    /// Wire and storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Invalid task status: {}", s))
    }
}

/// Stored task record
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Task {
    pub id: TaskId,
    pub owner_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_date: DateTime<Utc>,
}

/// Partial task update; `None` leaves a field untouched
///
/// There is no owner field: ownership never changes after creation.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskChanges {
    /// True when nothing would change
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.due_date.is_none()
    }
}

impl Task {
    /// Builds a new record owned by `owner`
    pub fn create(owner: UserId, input: NewTask) -> Self {
        let now = Utc::now();

        Self {
            id: TaskId::new(),
            owner_id: owner,
            title: normalize_text(&input.title),
            description: input.description.as_deref().map(normalize_text),
            status: input.status.unwrap_or_default(),
            due_date: input.due_date,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies `changes`, bumping `version` and `updated_at`
    pub fn apply(&mut self, changes: TaskChanges) {
        if let Some(title) = changes.title {
            self.title = normalize_text(&title);
        }
        if let Some(description) = changes.description {
            self.description = Some(normalize_text(&description));
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(due_date) = changes.due_date {
            self.due_date = due_date;
        }

        self.version += 1;
        self.updated_at = Utc::now();
    }

    /// Public projection without a relevance score
    pub fn to_view(&self) -> TaskView {
        TaskView::new(self, None)
    }
}

/// Task projection returned to callers
///
/// Owner and version are never included. `score` is only present on
/// search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: TaskId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub score: Option<f64>,
}

impl TaskView {
    pub fn new(task: &Task, score: Option<f64>) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            due_date: task.due_date,
            created_at: task.created_at,
            updated_at: task.updated_at,
            score,
        }
    }
}

/// Canonical form of task text: trimmed and lowercased
pub fn normalize_text(value: &str) -> String {
    value.trim().to_lowercase()
}
