//! Prometheus metrics for advisory-service.
//!
//! Covers HTTP traffic, which path answered each treatment request, and the
//! external provider's latency and failures.

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::{Once, OnceLock};

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// HTTP metrics
pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

// Advisory metrics
pub static ADVISORY_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static ADVISORY_PROVIDER_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static ADVISORY_PROVIDER_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static ADVISORY_TOKENS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Later calls are no-ops.
pub fn init_metrics() {
    static INIT: Once = Once::new();
    INIT.call_once(register_metrics);
}

fn register_metrics() {
    let registry = Registry::new();

    let http_requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("Failed to create http_requests_total metric");

    let http_request_duration = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        ),
        &["method", "path"],
    )
    .expect("Failed to create http_request_duration_seconds metric");

    // source: external | fallback; reason: none or the fallback cause
    let advisory_requests = IntCounterVec::new(
        Opts::new(
            "advisory_requests_total",
            "Treatment requests answered, by plan source",
        ),
        &["source", "reason"],
    )
    .expect("Failed to create advisory_requests_total metric");

    let provider_latency = HistogramVec::new(
        HistogramOpts::new(
            "advisory_provider_latency_seconds",
            "External provider latency in seconds",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["provider", "model"],
    )
    .expect("Failed to create advisory_provider_latency_seconds metric");

    let provider_errors = IntCounterVec::new(
        Opts::new(
            "advisory_provider_errors_total",
            "Total external provider errors",
        ),
        &["provider", "error_type"],
    )
    .expect("Failed to create advisory_provider_errors_total metric");

    let tokens = IntCounterVec::new(
        Opts::new("advisory_tokens_total", "Total tokens processed"),
        &["model", "type"], // type: input, output
    )
    .expect("Failed to create advisory_tokens_total metric");

    registry
        .register(Box::new(http_requests_total.clone()))
        .expect("Failed to register http_requests_total");
    registry
        .register(Box::new(http_request_duration.clone()))
        .expect("Failed to register http_request_duration_seconds");
    registry
        .register(Box::new(advisory_requests.clone()))
        .expect("Failed to register advisory_requests_total");
    registry
        .register(Box::new(provider_latency.clone()))
        .expect("Failed to register advisory_provider_latency_seconds");
    registry
        .register(Box::new(provider_errors.clone()))
        .expect("Failed to register advisory_provider_errors_total");
    registry
        .register(Box::new(tokens.clone()))
        .expect("Failed to register advisory_tokens_total");

    // Initialize globals
    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(http_requests_total);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(http_request_duration);
    let _ = ADVISORY_REQUESTS_TOTAL.set(advisory_requests);
    let _ = ADVISORY_PROVIDER_LATENCY_SECONDS.set(provider_latency);
    let _ = ADVISORY_PROVIDER_ERRORS_TOTAL.set(provider_errors);
    let _ = ADVISORY_TOKENS_TOTAL.set(tokens);

    tracing::info!("Prometheus metrics initialized");
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

// Helper functions for recording metrics

/// Record a completed HTTP request.
pub fn record_http_request(method: &str, path: &str, status: &str, duration_secs: f64) {
    if let Some(counter) = HTTP_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[method, path, status]).inc();
    }
    if let Some(histogram) = HTTP_REQUEST_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }
}

/// Record which path produced a treatment plan.
pub fn record_advice(source: &str, reason: &str) {
    if let Some(counter) = ADVISORY_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[source, reason]).inc();
    }
}

/// Record provider latency.
pub fn record_provider_latency(provider: &str, model: &str, duration_secs: f64) {
    if let Some(histogram) = ADVISORY_PROVIDER_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[provider, model])
            .observe(duration_secs);
    }
}

/// Record a provider error.
pub fn record_provider_error(provider: &str, error_type: &str) {
    if let Some(counter) = ADVISORY_PROVIDER_ERRORS_TOTAL.get() {
        counter.with_label_values(&[provider, error_type]).inc();
    }
}

/// Record token usage reported by the provider.
pub fn record_tokens(model: &str, input_tokens: i32, output_tokens: i32) {
    if let Some(counter) = ADVISORY_TOKENS_TOTAL.get() {
        counter
            .with_label_values(&[model, "input"])
            .inc_by(input_tokens.max(0) as u64);
        counter
            .with_label_values(&[model, "output"])
            .inc_by(output_tokens.max(0) as u64);
    }
}
