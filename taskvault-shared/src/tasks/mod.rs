//! Tasks
//!
//! - `query`: list plans, ordering, scoring and paging
//! - `service`: owner-scoped task operations

pub mod query;
pub mod service;

pub use query::{ListTasksParams, Page, SortDirection, SortField};
pub use service::TaskService;
