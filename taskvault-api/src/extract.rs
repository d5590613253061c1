/// Validating request extractors
///
/// `ValidatedJson<T>` and `ValidatedQuery<T>` deserialize the body or query
/// string and then run the `validator` rules on `T`. Any failure, including
/// malformed JSON, a missing field or an unknown field, is rejected with the
/// validation envelope before the handler runs.

use async_trait::async_trait;
use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{request::Parts, StatusCode},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::error::ApiError;
use taskvault_shared::auth::password::validate_password_strength;

/// JSON body that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

/// Query string that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(rejection.body_text()),
                _ => ApiError::invalid_field("body", rejection.body_text()),
            })?;

        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::invalid_field("query", rejection.body_text()))?;

        value.validate()?;
        Ok(ValidatedQuery(value))
    }
}

/// User names are stored trimmed, so the length bounds apply to the trimmed value
pub fn user_name_rule(user_name: &str) -> Result<(), ValidationError> {
    let len = user_name.trim().chars().count();
    if (3..=50).contains(&len) {
        return Ok(());
    }

    let mut err = ValidationError::new("length");
    err.message = Some("User name must be 3-50 characters".into());
    Err(err)
}

/// Password rule shared by every schema that takes a password
pub fn password_rule(password: &str) -> Result<(), ValidationError> {
    validate_password_strength(password).map_err(|reason| {
        let mut err = ValidationError::new("password");
        err.message = Some(reason.into());
        err
    })
}
