//! Chat-completions endpoint
//!
//! Accepts chat-completions requests. Chat-completions providers receive the
//! body as-is; messages providers receive a translated request and their
//! response (streaming or not) is translated back.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
    Extension, Json,
};
use tracing::{info, instrument};

use super::metrics::record_request;
use super::relay::{parse_body, relay, result_status, select_provider, Selected};
use crate::dialect::anthropic::{MessagesResponse, StreamEvent};
use crate::dialect::openai::ChatCompletionRequest;
use crate::dialect::translate::{chat_to_messages, messages_response_to_chat};
use crate::error::AppResult;
use crate::middleware::auth::AuthContext;
use crate::providers::Dialect;
use crate::streaming::{stream_response, MessagesToChatTranslator, SseEventSource};
use crate::AppState;

const ROUTE: &str = "chat_completions";

/// Handle chat completion requests
#[instrument(skip_all, fields(client_id = %auth.client_id))]
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    body: Bytes,
) -> AppResult<Response> {
    let started = Instant::now();
    let result = handle(&state, &body).await;

    let status = result_status(&result);
    record_request(ROUTE, status);
    info!(
        status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Chat completion finished"
    );
    result
}

async fn handle(state: &AppState, body: &[u8]) -> AppResult<Response> {
    let (raw, request) = parse_body::<ChatCompletionRequest>(body)?;
    let selected = select_provider(state, &request.model)?;

    info!(
        model = %request.model,
        provider = %selected.client.provider().name,
        dialect = %selected.client.dialect(),
        stream = request.stream,
        messages = request.messages.len(),
        "Processing chat completion request"
    );

    match selected.client.dialect() {
        Dialect::OpenAi => relay(&selected, raw, request.stream).await,
        Dialect::Anthropic => via_messages(&selected, &request).await,
    }
}

/// Serve a chat-completions request from a messages provider
async fn via_messages(selected: &Selected, request: &ChatCompletionRequest) -> AppResult<Response> {
    let upstream_request = chat_to_messages(request, &selected.upstream_model)?;
    let response = selected
        .client
        .send_json(&serde_json::to_value(&upstream_request)?)
        .await?;

    if request.stream {
        let source = SseEventSource::<StreamEvent>::from_response(response);
        let translator = MessagesToChatTranslator::new(&request.model);
        return Ok(stream_response(source, translator).await);
    }

    let upstream: MessagesResponse = response.json().await?;
    Ok(Json(messages_response_to_chat(upstream, &request.model)).into_response())
}
