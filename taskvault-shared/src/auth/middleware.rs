//! Session authentication
//!
//! Resolves the access token on a request to a user:
//!
//! 1. Take the token from the `accessToken` cookie, or else from an
//!    `Authorization: Bearer <token>` header
//! 2. Verify it as an access token
//! 3. Load the subject, which must still exist
//!
//! Success yields an [`AuthContext`] that the HTTP layer stores in request
//! extensions; nothing is written to storage. Every failure carries a
//! generic message that does not reveal which check failed.
//!
//! # Example
//!
//! ```no_run
//! use axum::http::HeaderMap;
//! use taskvault_shared::auth::middleware::SessionAuthenticator;
//!
//! async fn who(auth: &SessionAuthenticator, headers: &HeaderMap) {
//!     match auth.authenticate(headers).await {
//!         Ok(ctx) => println!("Hello, {}!", ctx.user.user_name),
//!         Err(e) => println!("Rejected: {}", e),
//!     }
//! }
//! ```

use std::sync::Arc;

use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::CookieJar;

use super::jwt::{TokenIssuer, TokenType};
use crate::error::CoreError;
use crate::models::{PublicUser, UserId};
use crate::store::CredentialStore;

/// Cookie carrying the access token
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Cookie carrying the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Authentication context added to request extensions
///
/// Handlers extract it with `Extension<AuthContext>`.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The authenticated user, without credential hash or session slot
    pub user: PublicUser,
}

impl AuthContext {
    pub fn user_id(&self) -> UserId {
        self.user.id
    }
}

/// Error type for session authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No token on the request
    #[error("Unauthorized Request!")]
    MissingCredentials,

    /// Token failed verification; the detail is for logs only
    #[error("Invalid Access Token!")]
    InvalidToken(String),

    /// Token is valid but its subject no longer exists
    #[error("Invalid Access Token!")]
    UnknownSubject,

    /// Storage failure while loading the subject
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<AuthError> for CoreError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::DatabaseError(detail) => CoreError::Internal(detail),
            other => CoreError::Unauthorized(other.to_string()),
        }
    }
}

/// Reads a non-empty cookie value
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(name)
        .map(|cookie| cookie.value().trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Reads the token of an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Access token of a request; the cookie wins over the header
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, ACCESS_TOKEN_COOKIE).or_else(|| bearer_token(headers))
}

/// Gate that turns a request's access token into an [`AuthContext`]
#[derive(Clone)]
pub struct SessionAuthenticator {
    issuer: Arc<TokenIssuer>,
    users: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for SessionAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionAuthenticator")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl SessionAuthenticator {
    pub fn new(issuer: Arc<TokenIssuer>, users: Arc<dyn CredentialStore>) -> Self {
        Self { issuer, users }
    }

    /// Authenticates a request by its headers
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        let token = extract_access_token(headers).ok_or(AuthError::MissingCredentials)?;
        self.authenticate_token(&token).await
    }

    /// Authenticates a raw access token
    pub async fn authenticate_token(&self, token: &str) -> Result<AuthContext, AuthError> {
        let claims = self
            .issuer
            .verify(token, TokenType::Access)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?
            .ok_or(AuthError::UnknownSubject)?;

        Ok(AuthContext {
            user: user.to_public(),
        })
    }
}
