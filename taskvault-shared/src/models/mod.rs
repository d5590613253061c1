//! Domain models
//!
//! # Models
//!
//! - `ids`: value-typed entity identifiers
//! - `user`: user accounts, credentials and the refresh token slot
//! - `task`: owner-scoped tasks

pub mod ids;
pub mod task;
pub mod user;

pub use ids::{TaskId, UserId};
pub use task::{NewTask, Task, TaskChanges, TaskStatus, TaskView};
pub use user::{CreateUser, PublicUser, UpdateUser, User};
