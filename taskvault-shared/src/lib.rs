//! # TaskVault Shared Library
//!
//! Core of the TaskVault service: accounts with a two-token session scheme
//! and an owner-scoped, searchable task list. Nothing here knows about HTTP
//! status codes; the API crate maps [`error::CoreError`] onto responses.
//!
//! ## Module Organization
//!
//! - `models`: users, tasks and their id types
//! - `auth`: password hashing, tokens, session authentication, ownership
//! - `store`: storage contracts with PostgreSQL and in-memory backends
//! - `db`: connection pool and migrations
//! - `accounts`: registration, login, refresh and account changes
//! - `tasks`: task listing, search and mutation
//! - `error`: core error taxonomy

pub mod accounts;
pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

/// Current version of the TaskVault shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
