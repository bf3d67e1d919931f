//! OAuth request shaping
//!
//! Some providers accept an already-issued OAuth access token only when the
//! request looks like it came from their own first-party client. A profile
//! describes that look: headers to overwrite, query parameters to append and
//! hooks that may rewrite (or refuse) the request before it is dispatched.
//!
//! Profiles are collected in [`OAuthProfiles`], built once at startup and
//! shared read-only afterwards.

use std::collections::HashMap;

use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Request;
use thiserror::Error;

use crate::providers::OAuthProviderType;

const X_API_KEY: &str = "x-api-key";

/// A hook that can mutate an outbound request in place, or refuse it
pub type RequestHook = fn(&mut Request) -> Result<(), HookError>;

/// Errors raised by request hooks
#[derive(Debug, Error)]
pub enum HookError {
    #[error("Header {name} is not valid for this request")]
    InvalidHeader { name: String },

    #[error("{0}")]
    Rejected(String),
}

/// Outbound customization for one OAuth provider type
#[derive(Debug, Clone, Default)]
pub struct OAuthProfile {
    headers: Vec<(HeaderName, HeaderValue)>,
    params: Vec<(String, String)>,
    hooks: Vec<RequestHook>,
}

impl OAuthProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Header overwritten on every request
    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers
            .push((HeaderName::from_static(name), HeaderValue::from_static(value)));
        self
    }

    /// Query parameter appended to every request
    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    /// Hook run after headers and params, in registration order
    pub fn with_hook(mut self, hook: RequestHook) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.params.is_empty() && self.hooks.is_empty()
    }

    /// Shape one outbound request.
    ///
    /// Headers are overwritten, query parameters are appended, then hooks run in
    /// order. The first failing hook aborts the attempt.
    pub fn apply(&self, request: &mut Request) -> Result<(), HookError> {
        for (name, value) in &self.headers {
            request.headers_mut().insert(name.clone(), value.clone());
        }

        if !self.params.is_empty() {
            let mut pairs = request.url_mut().query_pairs_mut();
            for (key, value) in &self.params {
                pairs.append_pair(key, value);
            }
        }

        for hook in &self.hooks {
            hook(request)?;
        }

        Ok(())
    }
}

/// Move an `X-Api-Key` credential into `Authorization: Bearer <key>`.
///
/// For upstreams that only accept bearer auth for OAuth tokens.
pub fn api_key_to_bearer(request: &mut Request) -> Result<(), HookError> {
    let key = match request.headers().get(X_API_KEY) {
        Some(value) if !value.is_empty() => value.clone(),
        _ => return Ok(()),
    };

    let key = key.to_str().map_err(|_| HookError::InvalidHeader {
        name: X_API_KEY.to_string(),
    })?;
    let bearer = HeaderValue::from_str(&format!("Bearer {}", key)).map_err(|_| {
        HookError::InvalidHeader {
            name: AUTHORIZATION.to_string(),
        }
    })?;

    request.headers_mut().insert(AUTHORIZATION, bearer);
    request.headers_mut().remove(X_API_KEY);
    Ok(())
}

/// Registry of shaping profiles keyed by OAuth provider type
#[derive(Debug, Clone, Default)]
pub struct OAuthProfiles {
    profiles: HashMap<OAuthProviderType, OAuthProfile>,
}

impl OAuthProfiles {
    /// Registry with no profiles
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding the profiles shipped with the gateway
    pub fn builtin() -> Self {
        Self::empty().with_profile(OAuthProviderType::ClaudeCode, claude_code_profile())
    }

    pub fn with_profile(mut self, provider_type: OAuthProviderType, profile: OAuthProfile) -> Self {
        self.profiles.insert(provider_type, profile);
        self
    }

    /// Profile for a provider type; types without customization yield `None`
    pub fn get(&self, provider_type: &OAuthProviderType) -> Option<&OAuthProfile> {
        self.profiles
            .get(provider_type)
            .filter(|profile| !profile.is_empty())
    }
}

fn claude_code_profile() -> OAuthProfile {
    OAuthProfile::new()
        .with_header(
            "anthropic-beta",
            "claude-code-20250219,oauth-2025-04-20,interleaved-thinking-2025-05-14,fine-grained-tool-streaming-2025-05-14",
        )
        .with_header("anthropic-dangerous-direct-browser-access", "true")
        .with_header("anthropic-version", "2023-06-01")
        .with_header("user-agent", "claude-cli/1.0.0 (external, cli)")
        .with_header("x-app", "cli")
        .with_param("beta", "true")
        .with_hook(api_key_to_bearer)
}
