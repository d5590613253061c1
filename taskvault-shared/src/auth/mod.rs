//! Authentication and authorization
//!
//! # Modules
//!
//! - [`password`]: Argon2id password hashing and strength rules
//! - [`jwt`]: access and refresh token issuing and verification
//! - [`refresh_slot`]: the single refresh token slot kept per user
//! - [`middleware`]: session authentication of incoming requests
//! - [`authorization`]: task ownership checks

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod refresh_slot;
