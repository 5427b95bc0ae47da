//! Application startup and lifecycle management.

use crate::config::AdvisoryConfig;
use crate::handlers::{create_treatment, health_check, metrics, not_found, readiness_check};
use crate::middleware::metrics_middleware;
use crate::services::prompt::SYSTEM_INSTRUCTION;
use crate::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use crate::services::providers::TextProvider;
use crate::services::TreatmentAdvisor;
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{request_id_middleware, security_headers_middleware};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub advisor: Arc<TreatmentAdvisor>,
}

impl AppState {
    pub fn new(advisor: TreatmentAdvisor) -> Self {
        Self {
            advisor: Arc::new(advisor),
        }
    }
}

/// Resolve the availability gate once: a Gemini-backed advisor when a
/// credential is configured, a fallback-only one otherwise.
pub fn build_advisor(config: &AdvisoryConfig) -> Result<TreatmentAdvisor, AppError> {
    let external_timeout = config.advisory.external_timeout;

    let Some(api_key) = config.gemini.api_key.clone() else {
        tracing::warn!(
            "GEMINI_API_KEY is not configured. AI features will use fallback responses."
        );
        return Ok(TreatmentAdvisor::new(None, external_timeout));
    };

    let provider = GeminiTextProvider::new(GeminiConfig {
        api_key,
        model: config.gemini.model.clone(),
        base_url: config.gemini.api_base.clone(),
        system_instruction: Some(SYSTEM_INSTRUCTION.to_string()),
        request_timeout: external_timeout,
    })
    .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Failed to create Gemini provider: {}", e)))?;

    tracing::info!(
        model = %config.gemini.model,
        timeout_secs = external_timeout.as_secs(),
        "Initialized Gemini text provider"
    );

    let provider: Arc<dyn TextProvider> = Arc::new(provider);
    Ok(TreatmentAdvisor::new(Some(provider), external_timeout))
}

/// Build the HTTP router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/treatment", post(create_treatment))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics))
        .route_layer(from_fn(metrics_middleware))
        .fallback(not_found)
        .layer(from_fn(security_headers_middleware))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(service_core::middleware::REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: AdvisoryConfig) -> Result<Self, AppError> {
        let advisor = build_advisor(&config)?;
        Self::with_advisor(config, advisor).await
    }

    /// Build around an already constructed advisor (used by tests to inject
    /// a mock provider).
    pub async fn with_advisor(
        config: AdvisoryConfig,
        advisor: TreatmentAdvisor,
    ) -> Result<Self, AppError> {
        crate::services::metrics::init_metrics();

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            external_provider = advisor.external_enabled(),
            "Advisory service listening"
        );

        Ok(Self {
            port,
            listener,
            state: AppState::new(advisor),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
