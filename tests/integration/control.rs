//! Control-plane endpoint tests
//!
//! - GET /api/status
//! - GET /api/providers (credentials redacted)
//! - GET /api/token (issues keys accepted by the model gate)

use axum::http::{header, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::Value;

use crate::common::{constants, test_data, TestHarness};

#[tokio::test]
async fn test_status_reports_provider_counts() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .get("/api/status")
        .add_header(header::AUTHORIZATION, harness.control_bearer().parse().unwrap())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["providers"], 4);
    assert_eq!(body["enabled_providers"], 3);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_providers_are_listed_without_credentials() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .get("/api/providers")
        .add_header(header::AUTHORIZATION, harness.control_bearer().parse().unwrap())
        .await;

    response.assert_status_ok();
    let text = response.text();
    assert!(!text.contains(constants::CHAT_PROVIDER_TOKEN));
    assert!(!text.contains(constants::OAUTH_PROVIDER_TOKEN));

    let body: Value = serde_json::from_str(&text).unwrap();
    let providers = body["providers"].as_array().unwrap();
    let names: Vec<&str> = providers.iter().map(|p| p["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["claude", "claude-oauth", "gpt", "retired"]);

    let oauth = &providers[1];
    assert_eq!(oauth["api_style"], "anthropic");
    assert_eq!(oauth["oauth_provider"], "claude_code");
    assert_eq!(oauth["proxied"], true);
    assert_eq!(oauth["token_fingerprint"].as_str().unwrap().len(), 12);
    assert_eq!(providers[3]["enabled"], false);
}

#[tokio::test]
async fn test_issued_token_passes_model_gate() {
    let harness = TestHarness::new().await;
    harness.chat.mock_completion("ok", "stop").await;

    let response = harness
        .server
        .get("/api/token")
        .add_query_param("client_id", "mobile-app")
        .add_header(header::AUTHORIZATION, harness.control_bearer().parse().unwrap())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["client_id"], "mobile-app");
    let token = body["token"].as_str().unwrap().to_string();

    harness
        .server
        .post("/v1/chat/completions")
        .add_header(header::AUTHORIZATION, format!("Bearer {}", token).parse().unwrap())
        .json(&test_data::chat_request("gpt-4o", false))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_token_requires_client_id() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .get("/api/token")
        .add_header(header::AUTHORIZATION, harness.control_bearer().parse().unwrap())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_reports_enabled_providers() {
    let harness = TestHarness::new().await;

    let response = harness.server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["providers"]["configured"], 4);
    assert_eq!(body["providers"]["enabled"], 3);
}
