//! Mock messages provider

use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Mock messages provider server wrapper
pub struct MockMessagesProvider {
    server: MockServer,
}

impl MockMessagesProvider {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Mock a non-streaming response with one text block
    pub async fn mock_message(&self, text: &str, stop_reason: &str) {
        let body = json!({
            "id": "msg_upstream",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": text}],
            "model": "claude-sonnet",
            "stop_reason": stop_reason,
            "stop_sequence": null,
            "usage": {"input_tokens": 9, "output_tokens": 4}
        });

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Mock a streaming response with a prepared SSE body
    pub async fn mock_stream(&self, body: String) {
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(body)
                    .insert_header("Content-Type", "text/event-stream"),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mock_error(&self, status: u16, message: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "type": "error",
                "error": {"type": "overloaded_error", "message": message}
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn received_bodies(&self) -> Vec<Value> {
        self.received_requests()
            .await
            .iter()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }

    pub async fn received_requests(&self) -> Vec<wiremock::Request> {
        self.server.received_requests().await.unwrap_or_default()
    }
}

/// Builder for messages SSE bodies
#[derive(Debug, Default)]
pub struct MessagesSse {
    body: String,
}

impl MessagesSse {
    pub fn new() -> Self {
        Self::default()
    }

    fn event(mut self, data: Value) -> Self {
        let name = data["type"].as_str().unwrap_or("unknown").to_string();
        self.body
            .push_str(&format!("event: {}\ndata: {}\n\n", name, data));
        self
    }

    pub fn start(self, input_tokens: u32) -> Self {
        self.event(json!({
            "type": "message_start",
            "message": {
                "id": "msg_upstream",
                "type": "message",
                "role": "assistant",
                "content": [],
                "model": "claude-sonnet",
                "stop_reason": null,
                "stop_sequence": null,
                "usage": {"input_tokens": input_tokens, "output_tokens": 1}
            }
        }))
    }

    pub fn text_start(self, index: u32) -> Self {
        self.event(json!({
            "type": "content_block_start",
            "index": index,
            "content_block": {"type": "text", "text": ""}
        }))
    }

    pub fn text(self, index: u32, text: &str) -> Self {
        self.event(json!({
            "type": "content_block_delta",
            "index": index,
            "delta": {"type": "text_delta", "text": text}
        }))
    }

    pub fn tool_start(self, index: u32, id: &str, name: &str) -> Self {
        self.event(json!({
            "type": "content_block_start",
            "index": index,
            "content_block": {"type": "tool_use", "id": id, "name": name, "input": {}}
        }))
    }

    pub fn tool_json(self, index: u32, partial: &str) -> Self {
        self.event(json!({
            "type": "content_block_delta",
            "index": index,
            "delta": {"type": "input_json_delta", "partial_json": partial}
        }))
    }

    pub fn block_stop(self, index: u32) -> Self {
        self.event(json!({"type": "content_block_stop", "index": index}))
    }

    pub fn ping(self) -> Self {
        self.event(json!({"type": "ping"}))
    }

    pub fn message_delta(self, stop_reason: &str, output_tokens: u32) -> Self {
        self.event(json!({
            "type": "message_delta",
            "delta": {"stop_reason": stop_reason, "stop_sequence": null},
            "usage": {"output_tokens": output_tokens}
        }))
    }

    pub fn error(self, message: &str) -> Self {
        self.event(json!({
            "type": "error",
            "error": {"type": "overloaded_error", "message": message}
        }))
    }

    pub fn stop(self) -> String {
        self.event(json!({"type": "message_stop"})).body
    }

    /// Body without the terminal `message_stop`
    pub fn build(self) -> String {
        self.body
    }
}
