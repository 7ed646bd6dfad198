use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value as JsonValue};
use tracing::{error, info};

use super::AppState;
use crate::health::HealthStatus;

/// GET /
pub async fn root() -> Json<JsonValue> {
    info!("Root endpoint accessed");
    Json(json!({ "message": "The API is working" }))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let health_status = state.health_checker.check_health().await;

    if health_status.is_healthy() {
        (StatusCode::OK, Json(health_status))
    } else {
        error!("Health check failed - database unreachable");
        (StatusCode::SERVICE_UNAVAILABLE, Json(health_status))
    }
}
