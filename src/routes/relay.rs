//! Shared plumbing for the model routes
//!
//! Body parsing, provider selection and same-dialect relay.

use std::sync::Arc;

use axum::response::Response;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::providers::route_model;
use crate::proxy::ProviderClient;
use crate::streaming::passthrough_response;
use crate::AppState;

/// Provider client and upstream model chosen for one request
pub struct Selected {
    pub client: Arc<ProviderClient>,
    pub upstream_model: String,
}

/// Parse a request body into its raw JSON and typed forms
pub fn parse_body<T: DeserializeOwned>(body: &[u8]) -> AppResult<(Value, T)> {
    let raw: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?;
    let typed = T::deserialize(&raw)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?;
    Ok((raw, typed))
}

/// Resolve the provider client for a client-supplied model name
pub fn select_provider(state: &AppState, model: &str) -> AppResult<Selected> {
    let route = route_model(
        state.providers.as_ref(),
        state.config.default_provider.as_deref(),
        model,
    )
    .ok_or_else(|| AppError::BadRequest(format!("No provider configured for model '{}'", model)))?;

    let client = state.clients.get(&route.provider).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Provider '{}' is unknown or disabled",
            route.provider
        ))
    })?;

    Ok(Selected {
        client,
        upstream_model: route.upstream_model,
    })
}

/// Forward a same-dialect request with only the model rewritten
pub async fn relay(selected: &Selected, mut raw: Value, streaming: bool) -> AppResult<Response> {
    if let Some(body) = raw.as_object_mut() {
        body.insert(
            "model".to_string(),
            Value::String(selected.upstream_model.clone()),
        );
    }

    let response = selected.client.send_json(&raw).await?;
    Ok(passthrough_response(response, streaming))
}

/// Status to record for a handler result
pub fn result_status(result: &AppResult<Response>) -> u16 {
    match result {
        Ok(response) => response.status().as_u16(),
        Err(e) => e.status_code().as_u16(),
    }
}
