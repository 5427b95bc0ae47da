use axum::{body::Bytes, extract::State, Extension, Json};
use service_core::middleware::RequestId;
use serde::Serialize;
use serde_json::Value;

use crate::models::TreatmentRequest;
use crate::services::AdvisoryError;
use crate::startup::AppState;

#[derive(Debug, Serialize)]
pub struct TreatmentResponse {
    pub treatment: Value,
}

/// `POST /treatment`: answer a disease report with a treatment plan.
///
/// Responds 200 whether the plan came from the model or the fallback.
#[tracing::instrument(skip_all, fields(request_id = %request_id.0))]
pub async fn create_treatment(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<TreatmentResponse>, AdvisoryError> {
    let request = decode_request(&body)?;

    let advice = state.advisor.advise(request).await?;

    tracing::debug!(source = advice.source.label(), "Serving treatment plan");

    Ok(Json(TreatmentResponse {
        treatment: advice.treatment,
    }))
}

/// An empty body or a JSON value that is not an object carries no fields, so
/// it fails validation like any other request missing them. Only bytes that
/// are not JSON at all are an `InvalidBody`.
fn decode_request(body: &[u8]) -> Result<TreatmentRequest, AdvisoryError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(TreatmentRequest::default());
    }

    let Json(value) = Json::<Value>::from_bytes(body).map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected treatment request body");
        AdvisoryError::InvalidBody(rejection.body_text())
    })?;

    if !value.is_object() {
        return Ok(TreatmentRequest::default());
    }

    serde_json::from_value(value).map_err(|e| {
        tracing::debug!(error = %e, "Treatment request has mistyped fields");
        AdvisoryError::InvalidBody(e.to_string())
    })
}
