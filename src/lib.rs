//! Switchyard - LLM API gateway
//!
//! Fronts several upstream model providers behind one endpoint. Requests are
//! authenticated, routed to a provider by model name, shaped for OAuth-fronted
//! providers, and translated between the chat-completions and messages wire
//! dialects, including incremental translation of streaming responses.

pub mod config;
pub mod dialect;
pub mod error;
pub mod middleware;
pub mod providers;
pub mod proxy;
pub mod routes;
pub mod streaming;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::info;

pub use crate::config::Config;
pub use crate::middleware::api_key::{ApiKeyValidator, JwtApiKeyValidator};
pub use crate::middleware::auth::AuthGate;
pub use crate::providers::{ProviderLookup, ProviderStore};
pub use crate::proxy::{OAuthProfiles, ProviderClients};

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    /// Provider records, read-only after startup
    pub providers: Arc<ProviderStore>,
    /// One customized upstream client per enabled provider
    pub clients: Arc<ProviderClients>,
    /// Signs and validates API keys
    pub api_keys: Arc<JwtApiKeyValidator>,
    pub gate: AuthGate,
    pub start_time: Instant,
}

impl AppState {
    /// Create a new application state, loading providers from disk
    pub fn new(config: Config) -> Result<Self> {
        let providers = ProviderStore::load(&config.providers_file)?;
        info!(
            count = providers.len(),
            path = %config.providers_file,
            "Provider records loaded"
        );
        Ok(Self::from_parts(config, providers, OAuthProfiles::builtin()))
    }

    /// Assemble state from already-loaded parts
    pub fn from_parts(config: Config, providers: ProviderStore, profiles: OAuthProfiles) -> Self {
        let clients = ProviderClients::build(&providers, &profiles);
        let api_keys = Arc::new(JwtApiKeyValidator::new(&config.jwt_secret));
        let gate = AuthGate::from_config(&config, api_keys.clone());

        Self {
            config,
            providers: Arc::new(providers),
            clients: Arc::new(clients),
            api_keys,
            gate,
            start_time: Instant::now(),
        }
    }
}
