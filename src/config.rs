//! Configuration management for Switchyard
//!
//! Configuration is loaded from environment variables. Provider records live
//! in a separate YAML file, see [`crate::providers::ProviderStore`].

use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Static secret accepted by the control-plane routes
    pub user_token: Option<String>,
    /// Static secret accepted by the model-invocation routes
    pub model_token: Option<String>,
    /// HS256 key used to sign and validate API keys
    pub jwt_secret: String,

    /// Path to the YAML provider file
    pub providers_file: String,
    /// Provider used when the model name carries no provider prefix
    pub default_provider: Option<String>,

    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("SWITCHYARD_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SWITCHYARD_PORT")
                .unwrap_or_else(|_| "12580".to_string())
                .parse()
                .context("Invalid SWITCHYARD_PORT")?,

            user_token: non_empty_var("SWITCHYARD_USER_TOKEN"),
            model_token: non_empty_var("SWITCHYARD_MODEL_TOKEN"),
            jwt_secret: env::var("SWITCHYARD_JWT_SECRET")
                .context("SWITCHYARD_JWT_SECRET must be set")?,

            providers_file: env::var("SWITCHYARD_PROVIDERS_FILE")
                .unwrap_or_else(|_| "config/providers.yaml".to_string()),
            default_provider: non_empty_var("SWITCHYARD_DEFAULT_PROVIDER"),

            log_json: env::var("SWITCHYARD_LOG_JSON")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        })
    }

    /// Whether a control-plane secret is configured
    pub fn has_user_token(&self) -> bool {
        self.user_token.is_some()
    }

    /// Whether a model-invocation secret is configured
    pub fn has_model_token(&self) -> bool {
        self.model_token.is_some()
    }
}

/// Read an environment variable, treating an empty value as unset
fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}
