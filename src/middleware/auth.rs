//! Authentication middleware
//!
//! Two gates guard the router. The control-plane gate fronts the `/api/*`
//! management routes and insists on a well-formed `Authorization: Bearer`
//! header. The model gate fronts the completion routes and also accepts the
//! `X-Api-Key` header that messages-dialect clients send.
//!
//! Both gates accept a configured static secret first and otherwise fall back
//! to signed API keys. Identity is attached to the request as [`AuthContext`].

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};

use super::api_key::ApiKeyValidator;
use crate::{config::Config, error::AppError, routes::metrics, AppState};

/// Identity for callers holding the control-plane secret
pub const USER_AUTHENTICATED: &str = "user_authenticated";

/// Identity for callers holding the model-invocation secret
pub const MODEL_AUTHENTICATED: &str = "model_authenticated";

const BEARER_PREFIX: &str = "Bearer ";

/// Caller identity resolved by a gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub client_id: String,
}

impl AuthContext {
    fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
        }
    }
}

/// Which gate rejected a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Control,
    Model,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Control => "control",
            AuthMode::Model => "model",
        }
    }
}

/// Strip one leading `Bearer ` if present
pub fn strip_bearer_prefix(token: &str) -> &str {
    token.strip_prefix(BEARER_PREFIX).unwrap_or(token)
}

/// SHA-256 fingerprint of a credential, safe to log
pub fn token_fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..12].to_string()
}

/// Static secrets plus the signed-key validator, shared by both gates
#[derive(Clone)]
pub struct AuthGate {
    user_token: Option<String>,
    model_token: Option<String>,
    validator: Arc<dyn ApiKeyValidator>,
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("user_token", &self.user_token.as_ref().map(|_| "[REDACTED]"))
            .field("model_token", &self.model_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AuthGate {
    pub fn new(
        user_token: Option<String>,
        model_token: Option<String>,
        validator: Arc<dyn ApiKeyValidator>,
    ) -> Self {
        Self {
            user_token,
            model_token,
            validator,
        }
    }

    pub fn from_config(config: &Config, validator: Arc<dyn ApiKeyValidator>) -> Self {
        Self::new(config.user_token.clone(), config.model_token.clone(), validator)
    }

    /// Resolve a control-plane caller from request headers
    pub fn authenticate_control(&self, headers: &HeaderMap) -> Result<AuthContext, AppError> {
        let auth_header = match headers.get(header::AUTHORIZATION) {
            Some(value) if !value.is_empty() => value
                .to_str()
                .map_err(|_| AppError::MalformedAuthorization)?,
            _ => return Err(AppError::MissingCredential),
        };

        let parts: Vec<&str> = auth_header.split(' ').collect();
        if parts.len() != 2 || parts[0] != "Bearer" {
            return Err(AppError::MalformedAuthorization);
        }
        let token = strip_bearer_prefix(parts[1]);

        if let Some(secret) = &self.user_token {
            if token == secret {
                return Ok(AuthContext::new(USER_AUTHENTICATED));
            }
        }

        self.validate_api_key(token)
    }

    /// Resolve a model-invocation caller from request headers.
    ///
    /// The static secret may arrive in either header. Signed keys are only
    /// read from `Authorization`; an `X-Api-Key` value never reaches the
    /// validator.
    pub fn authenticate_model(&self, headers: &HeaderMap) -> Result<AuthContext, AppError> {
        let auth_header = header_str(headers, header::AUTHORIZATION.as_str());
        let x_api_key = header_str(headers, "x-api-key");

        if auth_header.is_empty() && x_api_key.is_empty() {
            return Err(AppError::MissingCredential);
        }

        let token = strip_bearer_prefix(auth_header);

        if let Some(secret) = &self.model_token {
            if token == secret || x_api_key == secret {
                return Ok(AuthContext::new(MODEL_AUTHENTICATED));
            }
        }

        self.validate_api_key(token)
    }

    fn validate_api_key(&self, token: &str) -> Result<AuthContext, AppError> {
        match self.validator.validate(token) {
            Ok(claims) => Ok(AuthContext::new(claims.client_id)),
            Err(e) => {
                debug!(token = %token_fingerprint(token), error = %e, "API key rejected");
                Err(AppError::InvalidToken)
            }
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

fn finish(
    mode: AuthMode,
    result: Result<AuthContext, AppError>,
    request: &mut Request,
) -> Result<(), AppError> {
    match result {
        Ok(context) => {
            debug!(client_id = %context.client_id, mode = mode.as_str(), "Request authenticated");
            request.extensions_mut().insert(context);
            Ok(())
        }
        Err(e) => {
            warn!(mode = mode.as_str(), reason = %e, "Authentication rejected");
            metrics::record_auth_rejection(mode.as_str());
            Err(e)
        }
    }
}

/// Gate for the `/api/*` management routes
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn control_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let result = state.gate.authenticate_control(request.headers());
    finish(AuthMode::Control, result, &mut request)?;
    Ok(next.run(request).await)
}

/// Gate for the completion and messages routes
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn model_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let result = state.gate.authenticate_model(request.headers());
    finish(AuthMode::Model, result, &mut request)?;
    Ok(next.run(request).await)
}
