/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Greeting and health check
/// - `users`: Registration, login, session and account endpoints
/// - `tasks`: Task listing and mutation endpoints

pub mod health;
pub mod tasks;
pub mod users;
