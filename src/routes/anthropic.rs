//! Messages endpoint
//!
//! Accepts messages requests. Messages providers receive the body as-is;
//! chat-completions providers receive a translated request and their response
//! is translated back.

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
use crate::dialect::anthropic::MessagesRequest;
use crate::dialect::openai::{ChatCompletionResponse, StreamChunk};
use crate::dialect::translate::{chat_response_to_messages, messages_to_chat};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthContext;
use crate::providers::Dialect;
use crate::streaming::{stream_response, ChatToMessagesTranslator, SseEventSource};
use crate::AppState;

const ROUTE: &str = "messages";

/// Handle messages requests
#[instrument(skip_all, fields(client_id = %auth.client_id))]
pub async fn messages(
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
        "Messages request finished"
    );
    result
}

async fn handle(state: &AppState, body: &[u8]) -> AppResult<Response> {
    let (raw, request) = parse_body::<MessagesRequest>(body)?;
    let selected = select_provider(state, &request.model)?;

    info!(
        model = %request.model,
        provider = %selected.client.provider().name,
        dialect = %selected.client.dialect(),
        stream = request.stream,
        messages = request.messages.len(),
        "Processing messages request"
    );

    match selected.client.dialect() {
        Dialect::Anthropic => relay(&selected, raw, request.stream).await,
        Dialect::OpenAi => via_chat(&selected, &request).await,
    }
}

/// Serve a messages request from a chat-completions provider
async fn via_chat(selected: &Selected, request: &MessagesRequest) -> AppResult<Response> {
    let upstream_request = messages_to_chat(request, &selected.upstream_model)?;
    let response = selected
        .client
        .send_json(&serde_json::to_value(&upstream_request)?)
        .await?;

    if request.stream {
        let source = SseEventSource::<StreamChunk>::from_response(response);
        let translator = ChatToMessagesTranslator::new(&request.model);
        return Ok(stream_response(source, translator).await);
    }

    let status = response.status().as_u16();
    let upstream: ChatCompletionResponse = response.json().await?;
    let translated = chat_response_to_messages(upstream, &request.model).map_err(|e| {
        AppError::Upstream {
            status,
            message: e.to_string(),
        }
    })?;
    Ok(Json(translated).into_response())
}
