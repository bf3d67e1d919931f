//! Transport customization tests
//!
//! The `claude-oauth` provider is flagged `claude_code` and configured with an
//! unsupported proxy scheme, so its client falls back to a direct connection
//! and every request it sends is shaped.

use axum::http::header;
use pretty_assertions::assert_eq;

use crate::common::{constants, test_data, TestHarness};

#[tokio::test]
async fn test_oauth_provider_requests_are_shaped() {
    let harness = TestHarness::new().await;
    harness.messages.mock_message("Hi", "end_turn").await;

    harness
        .server
        .post("/anthropic/v1/messages")
        .add_header(header::AUTHORIZATION, harness.model_bearer().parse().unwrap())
        .json(&test_data::messages_request("claude-oauth/claude-sonnet", false))
        .await
        .assert_status_ok();

    let requests = harness.messages.received_requests().await;
    assert_eq!(requests.len(), 1);
    let request = &requests[0];

    assert_eq!(request.url.query(), Some("beta=true"));
    assert_eq!(
        request.headers.get("authorization").unwrap(),
        format!("Bearer {}", constants::OAUTH_PROVIDER_TOKEN).as_str()
    );
    assert!(request.headers.get("x-api-key").is_none());
    assert_eq!(
        request
            .headers
            .get("anthropic-dangerous-direct-browser-access")
            .unwrap(),
        "true"
    );
    assert_eq!(request.headers.get("anthropic-version").unwrap(), "2023-06-01");
    assert_eq!(request.headers.get("x-app").unwrap(), "cli");
    assert!(request.headers.get("anthropic-beta").is_some());
    assert!(request
        .headers
        .get("user-agent")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("claude-cli/"));
}

#[tokio::test]
async fn test_oauth_shaping_applies_to_translated_requests() {
    let harness = TestHarness::new().await;
    harness.messages.mock_message("Hi", "end_turn").await;

    harness
        .server
        .post("/v1/chat/completions")
        .add_header(header::AUTHORIZATION, harness.model_bearer().parse().unwrap())
        .json(&test_data::chat_request("claude-oauth/claude-sonnet", false))
        .await
        .assert_status_ok();

    let requests = harness.messages.received_requests().await;
    assert_eq!(requests[0].url.query(), Some("beta=true"));
    assert!(requests[0].headers.get("x-api-key").is_none());
}

#[tokio::test]
async fn test_plain_provider_requests_are_not_shaped() {
    let harness = TestHarness::new().await;
    harness.messages.mock_message("Hi", "end_turn").await;

    harness
        .server
        .post("/anthropic/v1/messages")
        .add_header(header::AUTHORIZATION, harness.model_bearer().parse().unwrap())
        .json(&test_data::messages_request("claude/claude-sonnet", false))
        .await
        .assert_status_ok();

    let requests = harness.messages.received_requests().await;
    assert_eq!(requests[0].url.query(), None);
    assert!(requests[0].headers.get("x-app").is_none());
    assert_eq!(
        requests[0].headers.get("x-api-key").unwrap(),
        constants::MESSAGES_PROVIDER_TOKEN
    );
}

#[tokio::test]
async fn test_unsupported_proxy_falls_back_to_direct_client() {
    let harness = TestHarness::new().await;
    let client = harness.state.clients.get("claude-oauth").unwrap();

    assert!(client.is_shaped());
    assert_eq!(
        switchyard::proxy::resolve_proxy(client.provider().proxy()),
        switchyard::proxy::resolve_proxy("")
    );
}
