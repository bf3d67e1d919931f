//! Authentication gate tests
//!
//! - Control-plane gate on `/api/*`
//! - Model gate on the completion routes
//! - 401 envelope shape

use axum::http::{header, HeaderName, StatusCode};
use serde_json::Value;

use crate::common::{constants, test_config, test_data, TestHarness};

const X_API_KEY: HeaderName = HeaderName::from_static("x-api-key");

fn assert_auth_error(body: &Value, message: &str) {
    assert_eq!(body["error"]["message"], message);
    assert_eq!(body["error"]["type"], "invalid_request_error");
}

#[tokio::test]
async fn test_control_static_secret_is_user_authenticated() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .get("/api/status")
        .add_header(header::AUTHORIZATION, harness.control_bearer().parse().unwrap())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["identity"], "user_authenticated");
}

#[tokio::test]
async fn test_control_signed_key_yields_client_id() {
    let harness = TestHarness::new().await;
    let key = harness.api_key("ops-dashboard");

    let response = harness
        .server
        .get("/api/status")
        .add_header(header::AUTHORIZATION, format!("Bearer {}", key).parse().unwrap())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["identity"], "ops-dashboard");
}

#[tokio::test]
async fn test_control_missing_header() {
    let harness = TestHarness::new().await;

    let response = harness.server.get("/api/status").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_auth_error(&response.json(), "Authorization header required");
}

#[tokio::test]
async fn test_control_malformed_header_rejected_even_with_valid_key() {
    let harness = TestHarness::new().await;
    let key = harness.api_key("ops-dashboard");

    for value in [
        format!("Bearer  {}", key),
        format!("Token {}", key),
        key.clone(),
        format!("Bearer {} extra", key),
    ] {
        let response = harness
            .server
            .get("/api/status")
            .add_header(header::AUTHORIZATION, value.parse().unwrap())
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_auth_error(
            &response.json(),
            "Invalid authorization header format. Expected: 'Bearer <token>'",
        );
    }
}

#[tokio::test]
async fn test_control_wrong_secret() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .get("/api/status")
        .add_header(header::AUTHORIZATION, "Bearer not-the-secret".parse().unwrap())
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_auth_error(&response.json(), "Invalid or expired token");
}

#[tokio::test]
async fn test_control_rejects_model_secret() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .get("/api/status")
        .add_header(header::AUTHORIZATION, harness.model_bearer().parse().unwrap())
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_model_x_api_key_static_secret_is_accepted() {
    let harness = TestHarness::new().await;
    harness.messages.mock_message("Hi", "end_turn").await;

    let response = harness
        .server
        .post("/anthropic/v1/messages")
        .add_header(X_API_KEY, constants::MODEL_TOKEN.parse().unwrap())
        .json(&test_data::messages_request("claude/claude-sonnet", false))
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_model_bearer_signed_key_is_accepted() {
    let harness = TestHarness::new().await;
    harness.chat.mock_completion("Hi", "stop").await;
    let key = harness.api_key("ci-runner");

    let response = harness
        .server
        .post("/v1/chat/completions")
        .add_header(header::AUTHORIZATION, format!("Bearer {}", key).parse().unwrap())
        .json(&test_data::chat_request("gpt-4o", false))
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_model_signed_key_in_x_api_key_is_not_validated() {
    let harness = TestHarness::new().await;
    let key = harness.api_key("ci-runner");

    let response = harness
        .server
        .post("/anthropic/v1/messages")
        .add_header(X_API_KEY, key.parse().unwrap())
        .json(&test_data::messages_request("claude/claude-sonnet", false))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_auth_error(&response.json(), "Invalid or expired token");
    assert!(harness.messages.received_requests().await.is_empty());
}

#[tokio::test]
async fn test_model_missing_credentials() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .post("/v1/chat/completions")
        .json(&test_data::chat_request("gpt-4o", false))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_auth_error(&response.json(), "Authorization header required");
    assert!(harness.chat.received_requests().await.is_empty());
}

#[tokio::test]
async fn test_model_gate_without_static_secret_uses_signed_keys_only() {
    let mut config = test_config();
    config.model_token = None;
    let harness = TestHarness::with_config(config).await;

    let response = harness
        .server
        .post("/v1/chat/completions")
        .add_header(
            header::AUTHORIZATION,
            format!("Bearer {}", constants::MODEL_TOKEN).parse().unwrap(),
        )
        .json(&test_data::chat_request("gpt-4o", false))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_public_routes_need_no_credentials() {
    let harness = TestHarness::new().await;

    harness.server.get("/health").await.assert_status_ok();
    harness.server.get("/health/live").await.assert_status_ok();
    harness.server.get("/metrics").await.assert_status_ok();
}
