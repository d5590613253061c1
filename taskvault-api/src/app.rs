/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskvault_api::{app::AppState, config::Config};
/// use taskvault_shared::store::Storage;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(config, Storage::memory());
/// let app = taskvault_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use taskvault_shared::{
    accounts::AccountService,
    auth::{jwt::TokenIssuer, middleware::SessionAuthenticator},
    store::Storage,
    tasks::TaskService,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Largest accepted request body
pub const BODY_LIMIT_BYTES: usize = 16 * 1024;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Every field is reference counted, so clones are shallow.
#[derive(Clone)]
pub struct AppState {
    /// Registration, login and session operations
    pub accounts: AccountService,

    /// Task operations
    pub tasks: TaskService,

    /// Access token gate
    pub authenticator: SessionAuthenticator,

    /// Storage backends
    pub storage: Storage,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(config: Config, storage: Storage) -> Self {
        let issuer = Arc::new(TokenIssuer::new(&config.tokens));

        Self {
            accounts: AccountService::new(
                storage.users.clone(),
                issuer.clone(),
                config.password_hash,
            ),
            tasks: TaskService::new(storage.tasks.clone()),
            authenticator: SessionAuthenticator::new(issuer, storage.users.clone()),
            storage,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /                               # greeting (public)
/// ├── GET /health                         # health check (public)
/// └── /api/v1/
///     ├── /user/
///     │   ├── POST /register              # public
///     │   ├── POST /login                 # public
///     │   ├── GET  /logout
///     │   ├── GET  /getCurrentUser
///     │   ├── GET|POST /refreshAccessToken
///     │   ├── POST /updateAccountInfo
///     │   ├── POST /updatePassword
///     │   └── GET  /deleteAccount
///     └── /task/                          # all authenticated
///         ├── GET  /getAllTasks
///         ├── GET  /getTaskById?taskId=
///         ├── POST /createTask
///         ├── POST /updateTask?taskId=
///         └── GET  /deleteTask?taskId=
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Body size limit
/// 5. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/", get(routes::health::greeting))
        .route("/health", get(routes::health::health_check));

    let open_user_routes = Router::new()
        .route("/register", post(routes::users::register))
        .route("/login", post(routes::users::login));

    let session_user_routes = Router::new()
        .route("/logout", get(routes::users::logout))
        .route("/getCurrentUser", get(routes::users::get_current_user))
        .route(
            "/refreshAccessToken",
            get(routes::users::refresh_access_token).post(routes::users::refresh_access_token),
        )
        .route("/updateAccountInfo", post(routes::users::update_account_info))
        .route("/updatePassword", post(routes::users::update_password))
        .route("/deleteAccount", get(routes::users::delete_account))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let task_routes = Router::new()
        .route("/getAllTasks", get(routes::tasks::get_all_tasks))
        .route("/getTaskById", get(routes::tasks::get_task_by_id))
        .route("/createTask", post(routes::tasks::create_task))
        .route("/updateTask", post(routes::tasks::update_task))
        .route("/deleteTask", get(routes::tasks::delete_task))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/user", open_user_routes.merge(session_user_routes))
        .nest("/task", task_routes);

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", v1_routes)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config.api.cors_origins))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// CORS from the configured origins; `*` is permissive
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Session authentication middleware layer
///
/// Resolves the access token from the `accessToken` cookie or the
/// Authorization header, then injects `AuthContext` into request extensions.
async fn session_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let context = state
        .authenticator
        .authenticate(req.headers())
        .await
        .map_err(|e| {
            tracing::debug!(error = ?e, "Request rejected by session authentication");
            ApiError::from(e)
        })?;

    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}
