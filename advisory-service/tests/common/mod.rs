//! Test helpers shared by the advisory-service integration tests.

#![allow(dead_code)]

use advisory_service::services::providers::TextProvider;
use advisory_service::services::TreatmentAdvisor;
use advisory_service::startup::{build_router, AppState};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

/// Router whose advisor never has a provider.
pub fn fallback_only_app() -> Router {
    build_router(AppState::new(TreatmentAdvisor::fallback_only()))
}

/// Router whose advisor consults `provider` with a short timeout.
pub fn app_with_provider(provider: Arc<dyn TextProvider>) -> Router {
    let advisor = TreatmentAdvisor::new(Some(provider), Duration::from_millis(300));
    build_router(AppState::new(advisor))
}

/// A request body with the three required fields set.
pub fn valid_body(treatment_type: Option<&str>) -> Value {
    let mut body = serde_json::json!({
        "plantName": "Tomato",
        "detectedDisease": "Late Blight",
        "observedSymptoms": "Dark lesions with white mould on leaf undersides",
        "affectedParts": "Leaves, stems",
        "severityLevel": "High",
        "spreadRate": "Fast",
        "weatherConditions": "Cool and wet",
        "previousDiseaseHistory": "None"
    });
    if let Some(kind) = treatment_type {
        body["preferredTreatmentType"] = Value::String(kind.to_string());
    }
    body
}

/// POST `body` to `/treatment` and return status plus raw body bytes.
pub async fn post_raw(app: Router, body: String) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/treatment")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

/// POST `body` as JSON to `/treatment` and decode the response.
pub async fn post_treatment(app: Router, body: &Value) -> (StatusCode, Value) {
    let (status, bytes) = post_raw(app, body.to_string()).await;
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
