/// User account endpoints
///
/// # Endpoints
///
/// - `POST /api/v1/user/register` - Register new user
/// - `POST /api/v1/user/login` - Login and get tokens
/// - `GET  /api/v1/user/logout` - Clear the session
/// - `GET  /api/v1/user/getCurrentUser` - Authenticated user's profile
/// - `GET|POST /api/v1/user/refreshAccessToken` - Rotate the token pair
/// - `POST /api/v1/user/updateAccountInfo` - Change username and/or email
/// - `POST /api/v1/user/updatePassword` - Change password
/// - `GET  /api/v1/user/deleteAccount` - Delete the account
///
/// Login, refresh and account updates answer with both tokens in the body
/// and set them as cookies. Logout and account deletion clear both cookies.

use crate::{
    app::AppState,
    cookies::{clear_session, set_session},
    error::ApiResult,
    extract::{password_rule, user_name_rule, ValidatedJson},
    response::ApiResponse,
};
use axum::{extract::State, Extension, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use taskvault_shared::{
    accounts::{Login, PasswordChange, Registration, Session},
    auth::{
        jwt::TokenPair,
        middleware::{AuthContext, REFRESH_TOKEN_COOKIE},
    },
    models::{PublicUser, UpdateUser},
};
use validator::{Validate, ValidationError};

/// Register request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    #[validate(custom(function = "user_name_rule"))]
    pub user_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(custom(function = "password_rule"))]
    pub password: String,
}

/// Login request; `userName` or `email` identifies the account
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[validate(schema(function = "login_identifier"))]
pub struct LoginRequest {
    #[validate(custom(function = "user_name_rule"))]
    pub user_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(custom(function = "password_rule"))]
    pub password: String,
}

fn login_identifier(req: &LoginRequest) -> Result<(), ValidationError> {
    if req.user_name.is_none() && req.email.is_none() {
        let mut err = ValidationError::new("identifier");
        err.message = Some("userName or email is required".into());
        return Err(err);
    }
    Ok(())
}

/// Refresh request body; the cookie takes precedence
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Account info update request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[validate(schema(function = "update_has_field"))]
pub struct UpdateAccountRequest {
    #[validate(custom(function = "user_name_rule"))]
    pub user_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

fn update_has_field(req: &UpdateAccountRequest) -> Result<(), ValidationError> {
    if req.user_name.is_none() && req.email.is_none() {
        let mut err = ValidationError::new("required");
        err.message = Some("userName or email is required".into());
        return Err(err);
    }
    Ok(())
}

/// Password change request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdatePasswordRequest {
    #[validate(custom(function = "password_rule"))]
    pub old_password: String,

    #[validate(custom(function = "password_rule"))]
    pub new_password: String,

    #[validate(custom(function = "password_rule"))]
    pub confirm_password: String,
}

/// Tokens plus the user they belong to
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub logged_in_user: PublicUser,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            access_token: session.tokens.access_token,
            refresh_token: session.tokens.refresh_token,
            logged_in_user: session.user,
        }
    }
}

/// A rotated token pair
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokensResponse {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<TokenPair> for TokensResponse {
    fn from(tokens: TokenPair) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }
    }
}

/// Register a new user
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Username or email already exists
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<ApiResponse<PublicUser>> {
    let user = state
        .accounts
        .register(Registration {
            username: req.user_name,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(ApiResponse::created("User Registered Successfully!", user))
}

/// Login with username or email
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or wrong password
/// - `404 Not Found`: No such user
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<(CookieJar, ApiResponse<SessionResponse>)> {
    let session = state
        .accounts
        .login(Login {
            username: req.user_name,
            email: req.email,
            password: req.password,
        })
        .await?;

    let jar = set_session(jar, &session.tokens);
    Ok((
        jar,
        ApiResponse::ok("User Logged In Successfully!", session.into()),
    ))
}

/// Clear the refresh token slot and both cookies
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, ApiResponse<()>)> {
    state.accounts.logout(auth.user_id()).await?;

    Ok((clear_session(jar), ApiResponse::message("User Logged Out!")))
}

/// Profile of the authenticated user
pub async fn get_current_user(
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<ApiResponse<PublicUser>> {
    Ok(ApiResponse::ok("User Fetched Successfully!", auth.user))
}

/// Exchange the refresh token for a new pair
///
/// The token is read from the `refreshToken` cookie, or else from the
/// `refreshToken` field of an optional JSON body.
///
/// # Errors
///
/// - `401 Unauthorized`: Token missing, invalid, or already used
pub async fn refresh_access_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> ApiResult<(CookieJar, ApiResponse<TokensResponse>)> {
    let presented = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| body.and_then(|Json(body)| body.refresh_token));

    let tokens = state.accounts.refresh(presented.as_deref()).await?;

    let jar = set_session(jar, &tokens);
    Ok((jar, ApiResponse::ok("Access Token Refreshed", tokens.into())))
}

/// Change username and/or email; issues a new session
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Value already taken (including by the caller)
pub async fn update_account_info(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<UpdateAccountRequest>,
) -> ApiResult<(CookieJar, ApiResponse<SessionResponse>)> {
    let session = state
        .accounts
        .update_account_info(
            auth.user_id(),
            UpdateUser {
                username: req.user_name,
                email: req.email,
            },
        )
        .await?;

    let jar = set_session(jar, &session.tokens);
    Ok((
        jar,
        ApiResponse::ok("User Details Updated Successfully!", session.into()),
    ))
}

/// Change password
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, confirmation mismatch, wrong old
///   password, or new password equal to the old one
pub async fn update_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<UpdatePasswordRequest>,
) -> ApiResult<ApiResponse<()>> {
    state
        .accounts
        .update_password(
            auth.user_id(),
            PasswordChange {
                old_password: req.old_password,
                new_password: req.new_password,
                confirm_password: req.confirm_password,
            },
        )
        .await?;

    Ok(ApiResponse::message("Password Updated Successfully!"))
}

/// Delete the account and clear both cookies
///
/// # Errors
///
/// - `404 Not Found`: Account vanished after authentication
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, ApiResponse<()>)> {
    state.accounts.delete_account(auth.user_id()).await?;

    Ok((clear_session(jar), ApiResponse::message("Account Deleted!")))
}
