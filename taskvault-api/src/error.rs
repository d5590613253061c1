/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>`, which is the one place a
/// failure becomes a response body.
///
/// # Response shapes
///
/// ```json
/// { "status": 404, "success": false, "message": "User doesn't exist!" }
/// ```
///
/// Structural validation failures use the success-style field names and
/// carry the failing fields:
///
/// ```json
/// {
///   "statusCode": 400,
///   "success": false,
///   "message": "Invalid Data, Error!",
///   "data": [{ "field": "email", "message": "Invalid email format" }]
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use taskvault_shared::error::CoreError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Message of the structural validation envelope
pub const VALIDATION_MESSAGE: &str = "Invalid Data, Error!";

const INTERNAL_MESSAGE: &str = "Something Went Wrong!";

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - e.g., duplicate email
    Conflict(String),

    /// Request failed structural validation (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Body over the size limit (413)
    PayloadTooLarge(String),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status code
    pub status: u16,

    /// Always false
    pub success: bool,

    /// Human-readable error message
    pub message: String,
}

/// Validation failure response format
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    pub status_code: u16,
    pub success: bool,
    pub message: String,
    pub data: Vec<ValidationErrorDetail>,
}

impl ApiError {
    /// A validation error for one field
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: field.into(),
            message: message.into(),
        }])
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match self {
            ApiError::ValidationError(errors) => {
                tracing::debug!(?errors, "Request failed validation");
                let body = Json(ValidationResponse {
                    status_code: status.as_u16(),
                    success: false,
                    message: VALIDATION_MESSAGE.to_string(),
                    data: errors,
                });
                return (status, body).into_response();
            }
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                INTERNAL_MESSAGE.to_string()
            }
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::PayloadTooLarge(msg) => msg,
        };

        let body = Json(ErrorResponse {
            status: status.as_u16(),
            success: false,
            message,
        });

        (status, body).into_response()
    }
}

/// Convert core errors to API errors
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput(msg) | CoreError::InvalidCredentials(msg) => {
                ApiError::BadRequest(msg)
            }
            CoreError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            CoreError::Forbidden(msg) => ApiError::Forbidden(msg),
            CoreError::NotFound(msg) => ApiError::NotFound(msg),
            CoreError::Conflict(msg) => ApiError::Conflict(msg),
            CoreError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

/// Convert session authentication errors to API errors
impl From<taskvault_shared::auth::middleware::AuthError> for ApiError {
    fn from(err: taskvault_shared::auth::middleware::AuthError) -> Self {
        CoreError::from(err).into()
    }
}

/// Converts `validator` output into field details, sorted by field
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                // struct-level rules report under `__all__`
                let field = match &*field {
                    "__all__" => "body".to_string(),
                    other => other.to_string(),
                };
                errs.iter().map(move |e| ValidationErrorDetail {
                    field: field.clone(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();

        details.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(details)
    }
}
