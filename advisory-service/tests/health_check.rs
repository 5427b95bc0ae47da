//! Integration tests that run the real server on a random port.

use advisory_service::config::{AdvisoryConfig, AdvisorySettings, GeminiSettings};
use advisory_service::services::providers::gemini::GEMINI_API_BASE;
use advisory_service::startup::Application;
use reqwest::Client;
use std::time::Duration;

fn test_config() -> AdvisoryConfig {
    AdvisoryConfig {
        common: service_core::config::Config {
            port: 0,
            log_level: "info".to_string(),
            otlp_endpoint: None,
        },
        gemini: GeminiSettings {
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            api_base: GEMINI_API_BASE.to_string(),
        },
        advisory: AdvisorySettings {
            external_timeout: Duration::from_secs(2),
        },
    }
}

/// Spawn the application on a random port and return the port number.
async fn spawn_app() -> u16 {
    let app = Application::build(test_config())
        .await
        .expect("Failed to build application");

    let port = app.port();

    tokio::spawn(async move {
        let _ = app.run_until_stopped().await;
    });

    port
}

#[tokio::test]
async fn health_check_reports_fallback_only_mode() {
    let port = spawn_app().await;
    let client = Client::new();

    let response = client
        .get(format!("http://127.0.0.1:{}/health", port))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "advisory-service");
    assert_eq!(body["external_provider"], "disabled");
}

#[tokio::test]
async fn readiness_check_returns_ok() {
    let port = spawn_app().await;

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/ready", port))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
async fn treatment_round_trip_over_http_echoes_request_id() {
    let port = spawn_app().await;

    let response = Client::new()
        .post(format!("http://127.0.0.1:{}/treatment", port))
        .header("x-request-id", "farm-42")
        .json(&serde_json::json!({
            "plantName": "Chili",
            "detectedDisease": "Leaf Curl",
            "observedSymptoms": "Upward curling leaves",
            "preferredTreatmentType": "Organic"
        }))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "farm-42");

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["treatment"]["treatment_recommendations"]["organic"].is_string());
    assert!(body["treatment"]["treatment_recommendations"]["chemical"].is_null());
}

#[tokio::test]
async fn metrics_endpoint_exposes_advisory_counters() {
    let port = spawn_app().await;
    let client = Client::new();

    client
        .post(format!("http://127.0.0.1:{}/treatment", port))
        .json(&serde_json::json!({
            "plantName": "Rice",
            "detectedDisease": "Blast",
            "observedSymptoms": "Diamond-shaped lesions"
        }))
        .send()
        .await
        .expect("Failed to send request");

    let text = client
        .get(format!("http://127.0.0.1:{}/metrics", port))
        .send()
        .await
        .expect("Failed to send request")
        .text()
        .await
        .expect("Failed to read body");

    assert!(text.contains("advisory_requests_total"));
    assert!(text.contains("http_requests_total"));
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let port = spawn_app().await;

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/products", port))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}
