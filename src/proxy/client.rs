//! Upstream provider clients
//!
//! One [`ProviderClient`] per configured provider, built once at startup: the
//! proxy-aware HTTP client plus the OAuth profile (if any) that shapes every
//! request it sends.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::{Request, Response};
use tracing::{debug, info, instrument, warn};

use super::headers::build_upstream_headers;
use super::oauth::{OAuthProfile, OAuthProfiles};
use super::transport::build_http_client;
use super::TransportError;
use crate::error::{AppError, AppResult};
use crate::providers::{Dialect, ProviderCredential, ProviderLookup};

/// Longest upstream error body echoed back to the client
const MAX_ERROR_BODY: usize = 1024;

/// HTTP client customized for one upstream provider
#[derive(Debug, Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    profile: Option<OAuthProfile>,
    provider: ProviderCredential,
}

impl ProviderClient {
    /// Build the client for `provider`.
    ///
    /// OAuth shaping is attached only when the provider is flagged as OAuth and
    /// its type has a registered profile.
    pub fn for_provider(provider: &ProviderCredential, profiles: &OAuthProfiles) -> Self {
        let http = build_http_client(provider.proxy());

        let profile = match &provider.oauth_provider {
            Some(provider_type) => {
                let profile = profiles.get(provider_type).cloned();
                if profile.is_none() {
                    debug!(provider = %provider.name, oauth_type = %provider_type, "No OAuth profile registered, sending unshaped requests");
                }
                profile
            }
            None => None,
        };

        Self {
            http,
            profile,
            provider: provider.clone(),
        }
    }

    pub fn provider(&self) -> &ProviderCredential {
        &self.provider
    }

    pub fn dialect(&self) -> Dialect {
        self.provider.api_style
    }

    pub fn is_shaped(&self) -> bool {
        self.profile.is_some()
    }

    /// Endpoint receiving completion calls for this provider's dialect
    pub fn endpoint(&self) -> String {
        let base = self.provider.api_base.trim_end_matches('/');
        match self.provider.api_style {
            Dialect::OpenAi => format!("{}/chat/completions", base),
            Dialect::Anthropic => format!("{}/v1/messages", base),
        }
    }

    /// Build an unshaped completion request carrying `body`
    pub fn build_request(&self, body: &serde_json::Value) -> Result<Request, TransportError> {
        let headers = build_upstream_headers(self.provider.api_style, &self.provider.token)?;
        let request = self
            .http
            .post(self.endpoint())
            .headers(headers)
            .json(body)
            .build()?;
        Ok(request)
    }

    /// Shape and dispatch one request
    pub async fn execute(&self, mut request: Request) -> Result<Response, TransportError> {
        if let Some(profile) = &self.profile {
            profile.apply(&mut request)?;
        }
        Ok(self.http.execute(request).await?)
    }

    /// Send a completion call and fail on non-success upstream status
    #[instrument(skip_all, fields(provider = %self.provider.name, dialect = %self.provider.api_style))]
    pub async fn send_json(&self, body: &serde_json::Value) -> AppResult<Response> {
        let request = self.build_request(body)?;
        let response = self.execute(request).await.map_err(|e| {
            warn!(error = %e, "Upstream call failed before a response was received");
            AppError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let mut text = response.text().await.unwrap_or_default();
            if text.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| text.is_char_boundary(*i))
                    .unwrap_or(0);
                text.truncate(cut);
            }
            warn!(status = %status, "Upstream returned an error status");
            return Err(AppError::Upstream {
                status: status.as_u16(),
                message: text,
            });
        }

        debug!(status = %status, "Upstream call accepted");
        Ok(response)
    }
}

/// Immutable set of provider clients, keyed by provider name
#[derive(Debug, Default)]
pub struct ProviderClients {
    clients: HashMap<String, Arc<ProviderClient>>,
}

impl ProviderClients {
    /// Build one client per enabled provider
    pub fn build(lookup: &dyn ProviderLookup, profiles: &OAuthProfiles) -> Self {
        let clients: HashMap<_, _> = lookup
            .list_providers()
            .into_iter()
            .filter(|p| p.enabled)
            .map(|p| (p.name.clone(), Arc::new(ProviderClient::for_provider(p, profiles))))
            .collect();

        info!(count = clients.len(), "Provider clients initialized");
        Self { clients }
    }

    pub fn get(&self, name: &str) -> Option<Arc<ProviderClient>> {
        self.clients.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
