//! Failure taxonomy of the treatment advisory flow.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use super::providers::ProviderError;

/// Everything that can go wrong while answering a treatment request.
///
/// Only `InvalidRequest`, `InvalidBody` and `FallbackConstructionFailed` ever
/// reach the caller. The external-path variants are absorbed by the advisor
/// and kept as the reason a fallback plan was served.
#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("External service unavailable: no credential configured")]
    ExternalServiceUnavailable,

    #[error("External call failed: {0}")]
    ExternalCallFailed(#[from] ProviderError),

    #[error("Response unparseable: {0}")]
    ResponseUnparseable(String),

    #[error("Fallback construction failed: {0}")]
    FallbackConstructionFailed(#[source] serde_json::Error),
}

impl AdvisoryError {
    /// Label for the `reason` metric dimension and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            AdvisoryError::InvalidRequest(_) => "invalid_request",
            AdvisoryError::InvalidBody(_) => "invalid_body",
            AdvisoryError::ExternalServiceUnavailable => "external_unavailable",
            AdvisoryError::ExternalCallFailed(_) => "external_call_failed",
            AdvisoryError::ResponseUnparseable(_) => "response_unparseable",
            AdvisoryError::FallbackConstructionFailed(_) => "fallback_construction_failed",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl IntoResponse for AdvisoryError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AdvisoryError::InvalidRequest(_) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    message: "Missing required fields",
                    error: None,
                },
            ),
            AdvisoryError::InvalidBody(_) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    message: "Invalid request body",
                    error: None,
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    message: "Error generating treatment recommendation",
                    error: Some(self.to_string()),
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}
