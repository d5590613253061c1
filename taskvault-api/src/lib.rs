//! # TaskVault API Server Library
//!
//! HTTP surface of TaskVault: configuration, routing, request validation,
//! response envelopes and cookie transport of session tokens.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `cookies`: Session cookie helpers
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Validating request extractors
//! - `middleware`: Security headers
//! - `response`: Success envelope
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod cookies;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod response;
pub mod routes;
