/// Health check endpoint
///
/// Provides a simple health check endpoint that verifies:
/// - The server is running
/// - Storage connectivity
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "storage": "connected"
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,

    /// Storage status
    pub storage: String,
}

/// Health check handler
///
/// Returns `degraded` rather than an error when storage does not answer.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let storage_status = match state.storage.users.health_check().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "Storage health check failed");
            "disconnected"
        }
    };

    Ok(Json(HealthResponse {
        status: if storage_status == "connected" {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: storage_status.to_string(),
    }))
}

/// `GET /`
pub async fn greeting() -> Json<Value> {
    Json(json!({ "Message": "Hi!" }))
}
