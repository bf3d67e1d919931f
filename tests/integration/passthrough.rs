//! Same-dialect passthrough tests
//!
//! When the client and provider speak the same dialect the upstream body is
//! relayed unmodified; only the model name is rewritten on the way out.

use axum::http::header;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{test_data, TestHarness};
use crate::mocks::{ChatSse, MessagesSse};

#[tokio::test]
async fn test_chat_passthrough_keeps_unknown_fields() {
    let harness = TestHarness::new().await;
    harness.chat.mock_completion("Hello", "stop").await;

    let mut request = test_data::chat_request("gpt/gpt-4o", false);
    request["seed"] = json!(42);
    request["logprobs"] = json!(true);

    let response = harness
        .server
        .post("/openai/v1/chat/completions")
        .add_header(header::AUTHORIZATION, harness.model_bearer().parse().unwrap())
        .json(&request)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["id"], "chatcmpl-upstream");
    assert_eq!(body["choices"][0]["message"]["content"], "Hello");

    let upstream = harness.chat.received_bodies().await;
    assert_eq!(upstream[0]["model"], "gpt-4o");
    assert_eq!(upstream[0]["seed"], 42);
    assert_eq!(upstream[0]["logprobs"], true);
}

#[tokio::test]
async fn test_chat_stream_passthrough_is_byte_identical() {
    let harness = TestHarness::new().await;
    let sse = ChatSse::new()
        .role()
        .text("Hi")
        .finish("stop")
        .usage(3, 1)
        .done();
    harness.chat.mock_stream(sse.clone()).await;

    let response = harness
        .server
        .post("/v1/chat/completions")
        .add_header(header::AUTHORIZATION, harness.model_bearer().parse().unwrap())
        .json(&test_data::chat_request("gpt-4o", true))
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "text/event-stream");
    assert_eq!(response.text(), sse);
}

#[tokio::test]
async fn test_messages_stream_passthrough_is_byte_identical() {
    let harness = TestHarness::new().await;
    let sse = MessagesSse::new()
        .start(4)
        .text_start(0)
        .text(0, "Hi")
        .block_stop(0)
        .message_delta("end_turn", 2)
        .stop();
    harness.messages.mock_stream(sse.clone()).await;

    let response = harness
        .server
        .post("/v1/messages")
        .add_header(header::AUTHORIZATION, harness.model_bearer().parse().unwrap())
        .json(&test_data::messages_request("claude/claude-sonnet", true))
        .await;

    response.assert_status_ok();
    assert_eq!(response.text(), sse);

    let upstream = harness.messages.received_bodies().await;
    assert_eq!(upstream[0]["model"], "claude-sonnet");
    assert_eq!(upstream[0]["max_tokens"], 256);
}
