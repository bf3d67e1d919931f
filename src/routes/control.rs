//! Control-plane endpoints
//!
//! Read-only views of the gateway plus API key issuance. All routes sit behind
//! the control-plane gate.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{token_fingerprint, AuthContext};
use crate::providers::{Dialect, ProviderLookup};
use crate::AppState;

/// Gateway status
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub identity: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub providers: usize,
    pub enabled_providers: usize,
}

/// Provider record with the credential replaced by its fingerprint
#[derive(Debug, Serialize)]
pub struct ProviderSummary {
    pub name: String,
    pub api_base: String,
    pub api_style: Dialect,
    pub token_fingerprint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_provider: Option<String>,
    pub proxied: bool,
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderSummary>,
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    pub client_id: String,
    /// Lifetime in seconds; omitted means the key never expires
    pub ttl_seconds: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub client_id: String,
    pub token: String,
}

/// `GET /api/status`
pub async fn status(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Json<StatusResponse> {
    Json(StatusResponse {
        identity: auth.client_id,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        providers: state.providers.len(),
        enabled_providers: state.clients.len(),
    })
}

/// `GET /api/providers`
pub async fn list_providers(State(state): State<Arc<AppState>>) -> Json<ProvidersResponse> {
    let providers = state
        .providers
        .list_providers()
        .into_iter()
        .map(|p| ProviderSummary {
            name: p.name.clone(),
            api_base: p.api_base.clone(),
            api_style: p.api_style,
            token_fingerprint: token_fingerprint(&p.token),
            oauth_provider: p.oauth_provider.as_ref().map(|t| t.to_string()),
            proxied: !p.proxy().is_empty(),
            enabled: p.enabled,
        })
        .collect();

    Json(ProvidersResponse { providers })
}

/// `GET /api/token?client_id=<id>[&ttl_seconds=<n>]`
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<TokenQuery>,
) -> AppResult<Json<TokenResponse>> {
    if query.client_id.is_empty() {
        return Err(AppError::BadRequest("client_id is required".to_string()));
    }

    let token = state
        .api_keys
        .issue_with_ttl(&query.client_id, query.ttl_seconds.map(Duration::from_secs))
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

    info!(
        issued_by = %auth.client_id,
        client_id = %query.client_id,
        fingerprint = %token_fingerprint(&token),
        "API key issued"
    );

    Ok(Json(TokenResponse {
        client_id: query.client_id,
        token,
    }))
}
