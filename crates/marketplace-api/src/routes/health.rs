//! Health check endpoints

use axum::{Router, routing::get};
use serde::Serialize;

use crate::response::ApiResponse;
use crate::state::AppState;

/// Health status response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Readiness handler
async fn health() -> ApiResponse<HealthResponse> {
    metrics::counter!("marketplace_health_checks_total").increment(1);

    ApiResponse::ok(
        "Service is ready",
        HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    )
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
}
