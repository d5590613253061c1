//! Core error taxonomy
//!
//! Every fallible operation in the account and task services returns exactly
//! one [`CoreError`] kind plus a human-readable message. The HTTP layer turns
//! these into response envelopes; nothing in this crate knows about status codes.
//!
//! Storage and crypto failures are re-classified as [`CoreError::Internal`].
//! Their detail is kept in the error (and logged at the boundary) but callers
//! only ever see a fixed generic message.

use crate::store::StoreError;

/// Result alias used by the service layer
pub type CoreResult<T> = Result<T, CoreError>;

/// Error kinds surfaced by the core
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Missing or malformed input
    #[error("{0}")]
    InvalidInput(String),

    /// Password did not verify
    #[error("{0}")]
    InvalidCredentials(String),

    /// Missing, invalid, expired or superseded token
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but not the owner of the resource
    #[error("{0}")]
    Forbidden(String),

    /// Uniqueness violation
    #[error("{0}")]
    Conflict(String),

    /// Referenced entity is absent
    #[error("{0}")]
    NotFound(String),

    /// Store/crypto failure or a violated internal invariant
    #[error("{0}")]
    Internal(String),
}

impl CoreError {
    /// Short machine-readable name of the kind
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::InvalidInput(_) => "invalid_input",
            CoreError::InvalidCredentials(_) => "invalid_credentials",
            CoreError::Unauthorized(_) => "unauthorized",
            CoreError::Forbidden(_) => "forbidden",
            CoreError::Conflict(_) => "conflict",
            CoreError::NotFound(_) => "not_found",
            CoreError::Internal(_) => "internal",
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(field) => {
                CoreError::Conflict(format!("This {} Already Exists!", field))
            }
            other => CoreError::Internal(format!("Store failure: {}", other)),
        }
    }
}

impl From<crate::auth::password::PasswordError> for CoreError {
    fn from(err: crate::auth::password::PasswordError) -> Self {
        CoreError::Internal(format!("Password operation failed: {}", err))
    }
}
