//! Common test utilities for Switchyard
//!
//! Shared fixtures: configuration constants, a provider set pointing at the
//! mock upstreams, and a harness running the real router.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{json, Value};

use switchyard::providers::{Dialect, OAuthProviderType, ProviderCredential, ProviderStore};
use switchyard::proxy::OAuthProfiles;
use switchyard::{routes, AppState, Config, JwtApiKeyValidator};

use crate::mocks::{MockChatProvider, MockMessagesProvider};

/// Test configuration constants
pub mod constants {
    pub const JWT_SECRET: &str = "test-jwt-secret";
    pub const USER_TOKEN: &str = "test-user-secret";
    pub const MODEL_TOKEN: &str = "test-model-secret";
    pub const CHAT_PROVIDER_TOKEN: &str = "sk-upstream-chat";
    pub const MESSAGES_PROVIDER_TOKEN: &str = "sk-ant-upstream";
    pub const OAUTH_PROVIDER_TOKEN: &str = "oat-upstream";
}

/// Configuration with both static secrets set and `gpt` as the default provider
pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        user_token: Some(constants::USER_TOKEN.to_string()),
        model_token: Some(constants::MODEL_TOKEN.to_string()),
        jwt_secret: constants::JWT_SECRET.to_string(),
        providers_file: String::new(),
        default_provider: Some("gpt".to_string()),
        log_json: false,
    }
}

fn provider(name: &str, base: &str, dialect: Dialect, token: &str) -> ProviderCredential {
    ProviderCredential {
        name: name.to_string(),
        api_base: base.to_string(),
        api_style: dialect,
        token: token.to_string(),
        oauth_provider: None,
        proxy_url: None,
        enabled: true,
    }
}

/// Router harness backed by one mock upstream per dialect
///
/// Providers:
/// - `gpt` (default): chat-completions dialect, at the chat mock
/// - `claude`: messages dialect, at the messages mock
/// - `claude-oauth`: messages dialect with `claude_code` shaping and an
///   unsupported proxy scheme
/// - `retired`: disabled
pub struct TestHarness {
    pub server: TestServer,
    pub chat: MockChatProvider,
    pub messages: MockMessagesProvider,
    pub state: Arc<AppState>,
}

impl TestHarness {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let chat = MockChatProvider::start().await;
        let messages = MockMessagesProvider::start().await;

        let mut oauth = provider(
            "claude-oauth",
            &messages.uri(),
            Dialect::Anthropic,
            constants::OAUTH_PROVIDER_TOKEN,
        );
        oauth.oauth_provider = Some(OAuthProviderType::ClaudeCode);
        oauth.proxy_url = Some("ftp://unsupported.example:21".to_string());

        let mut retired = provider("retired", &chat.uri(), Dialect::OpenAi, "sk-old");
        retired.enabled = false;

        let store = ProviderStore::new(vec![
            provider("gpt", &chat.uri(), Dialect::OpenAi, constants::CHAT_PROVIDER_TOKEN),
            provider(
                "claude",
                &messages.uri(),
                Dialect::Anthropic,
                constants::MESSAGES_PROVIDER_TOKEN,
            ),
            oauth,
            retired,
        ]);

        let state = Arc::new(AppState::from_parts(config, store, OAuthProfiles::builtin()));
        let app = routes::create_router(state.clone());
        let server = TestServer::new(app).expect("Failed to create test server");

        Self {
            server,
            chat,
            messages,
            state,
        }
    }

    /// Signed API key for `client_id`
    pub fn api_key(&self, client_id: &str) -> String {
        JwtApiKeyValidator::new(constants::JWT_SECRET)
            .issue(client_id)
            .unwrap()
    }

    pub fn model_bearer(&self) -> String {
        format!("Bearer {}", constants::MODEL_TOKEN)
    }

    pub fn control_bearer(&self) -> String {
        format!("Bearer {}", constants::USER_TOKEN)
    }
}

/// Sample request bodies
pub mod test_data {
    use super::*;

    pub fn chat_request(model: &str, stream: bool) -> Value {
        json!({
            "model": model,
            "messages": [
                {"role": "system", "content": "Be brief."},
                {"role": "user", "content": "Hello!"}
            ],
            "stream": stream
        })
    }

    pub fn messages_request(model: &str, stream: bool) -> Value {
        json!({
            "model": model,
            "max_tokens": 256,
            "system": "Be brief.",
            "messages": [{"role": "user", "content": "Hello!"}],
            "stream": stream
        })
    }
}

/// Parsed SSE frame: optional event name plus the data payload
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub event: Option<String>,
    pub data: String,
}

impl Frame {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.data).unwrap()
    }
}

/// Split an SSE body into frames
pub fn parse_sse(body: &str) -> Vec<Frame> {
    body.split("\n\n")
        .filter(|block| !block.trim().is_empty())
        .map(|block| {
            let mut event = None;
            let mut data = String::new();
            for line in block.lines() {
                if let Some(name) = line.strip_prefix("event: ") {
                    event = Some(name.to_string());
                } else if let Some(payload) = line.strip_prefix("data: ") {
                    data.push_str(payload);
                }
            }
            Frame { event, data }
        })
        .collect()
}
