use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;

use crate::startup::AppState;

/// Liveness probe. Reports whether the external model is in use but never
/// calls it.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let external = if state.advisor.external_enabled() {
        "enabled"
    } else {
        "disabled"
    };

    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "advisory-service",
            "version": env!("CARGO_PKG_VERSION"),
            "external_provider": external
        })),
    )
}

/// Readiness probe. The fallback path needs no dependencies, so a running
/// process is always ready.
pub async fn readiness_check() -> StatusCode {
    StatusCode::OK
}

pub async fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("No such route"))
}
