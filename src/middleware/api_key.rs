//! Signed API keys
//!
//! API keys are HS256 JWTs carrying the caller's client id. Validation is pure
//! computation; no I/O happens on the request path.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims embedded in an API key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyClaims {
    /// Caller identity
    pub client_id: String,
    /// Issued at (unix seconds)
    pub iat: u64,
    /// Expiry (unix seconds); keys without one never expire
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

/// Errors from issuing or validating API keys
#[derive(Debug, Error)]
pub enum ApiKeyError {
    #[error("Invalid API key: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("API key carries no client id")]
    MissingClientId,
}

/// Validates signed API keys
pub trait ApiKeyValidator: Send + Sync {
    fn validate(&self, token: &str) -> Result<ApiKeyClaims, ApiKeyError>;
}

/// HS256 JWT implementation of [`ApiKeyValidator`]
#[derive(Clone)]
pub struct JwtApiKeyValidator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for JwtApiKeyValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtApiKeyValidator")
            .field("algorithm", &Algorithm::HS256)
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl JwtApiKeyValidator {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims = HashSet::new();

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Issue a non-expiring key for `client_id`
    pub fn issue(&self, client_id: &str) -> Result<String, ApiKeyError> {
        self.issue_with_ttl(client_id, None)
    }

    /// Issue a key for `client_id`, optionally expiring after `ttl`
    pub fn issue_with_ttl(&self, client_id: &str, ttl: Option<Duration>) -> Result<String, ApiKeyError> {
        if client_id.is_empty() {
            return Err(ApiKeyError::MissingClientId);
        }

        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let claims = ApiKeyClaims {
            client_id: client_id.to_string(),
            iat: now,
            exp: ttl.map(|ttl| now + ttl.as_secs()),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }
}

impl ApiKeyValidator for JwtApiKeyValidator {
    fn validate(&self, token: &str) -> Result<ApiKeyClaims, ApiKeyError> {
        let data = decode::<ApiKeyClaims>(token, &self.decoding_key, &self.validation)?;
        if data.claims.client_id.is_empty() {
            return Err(ApiKeyError::MissingClientId);
        }
        Ok(data.claims)
    }
}
