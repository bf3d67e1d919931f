//! Mock chat-completions provider
//!
//! # Example
//!
//! ```rust,ignore
//! let provider = MockChatProvider::start().await;
//! provider.mock_stream(ChatSse::new().text("Hi").finish("stop").done()).await;
//! // point a provider record at provider.uri()
//! ```

use serde_json::{json, Value};
use wiremock::{
    matchers::{header_exists, method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Mock chat-completions provider server wrapper
pub struct MockChatProvider {
    server: MockServer,
}

impl MockChatProvider {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Mock a non-streaming completion with one text choice
    pub async fn mock_completion(&self, content: &str, finish_reason: &str) {
        let body = json!({
            "id": "chatcmpl-upstream",
            "object": "chat.completion",
            "created": 1706745600,
            "model": "gpt-4o",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": finish_reason
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17}
        });

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header_exists("Authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Mock a streaming completion with a prepared SSE body
    pub async fn mock_stream(&self, body: String) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header_exists("Authorization"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(body)
                    .insert_header("Content-Type", "text/event-stream")
                    .insert_header("Cache-Control", "no-cache"),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock an error status with a provider-style error body
    pub async fn mock_error(&self, status: u16, message: &str) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": {"message": message, "type": "server_error"}
            })))
            .mount(&self.server)
            .await;
    }

    /// JSON bodies of all requests received so far
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

/// Builder for chat-completions SSE bodies
#[derive(Debug, Default)]
pub struct ChatSse {
    body: String,
}

impl ChatSse {
    pub fn new() -> Self {
        Self::default()
    }

    fn chunk(mut self, delta: Value, finish_reason: Option<&str>) -> Self {
        let chunk = json!({
            "id": "chatcmpl-upstream",
            "object": "chat.completion.chunk",
            "created": 1706745600,
            "model": "gpt-4o",
            "choices": [{"index": 0, "delta": delta, "finish_reason": finish_reason}]
        });
        self.body.push_str(&format!("data: {}\n\n", chunk));
        self
    }

    pub fn role(self) -> Self {
        self.chunk(json!({"role": "assistant", "content": ""}), None)
    }

    pub fn text(self, text: &str) -> Self {
        self.chunk(json!({"content": text}), None)
    }

    /// First delta of a tool call, carrying its id and name
    pub fn tool_start(self, index: u32, id: &str, name: &str) -> Self {
        self.chunk(
            json!({"tool_calls": [{
                "index": index,
                "id": id,
                "type": "function",
                "function": {"name": name, "arguments": ""}
            }]}),
            None,
        )
    }

    pub fn tool_args(self, index: u32, fragment: &str) -> Self {
        self.chunk(
            json!({"tool_calls": [{"index": index, "function": {"arguments": fragment}}]}),
            None,
        )
    }

    pub fn finish(self, reason: &str) -> Self {
        self.chunk(json!({}), Some(reason))
    }

    /// Usage-only chunk with no choices
    pub fn usage(mut self, prompt: u32, completion: u32) -> Self {
        let chunk = json!({
            "id": "chatcmpl-upstream",
            "object": "chat.completion.chunk",
            "created": 1706745600,
            "model": "gpt-4o",
            "choices": [],
            "usage": {
                "prompt_tokens": prompt,
                "completion_tokens": completion,
                "total_tokens": prompt + completion
            }
        });
        self.body.push_str(&format!("data: {}\n\n", chunk));
        self
    }

    pub fn error(mut self, message: &str) -> Self {
        let body = json!({"error": {"message": message, "type": "server_error"}});
        self.body.push_str(&format!("data: {}\n\n", body));
        self
    }

    pub fn done(mut self) -> String {
        self.body.push_str("data: [DONE]\n\n");
        self.body
    }

    /// Body without the `[DONE]` marker
    pub fn build(self) -> String {
        self.body
    }
}
