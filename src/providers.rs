//! Provider records
//!
//! Read-only view of the configured upstream providers. Records are loaded once
//! from a YAML file at startup and never mutated afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Wire dialect spoken by a client or an upstream provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Chat-completions style (`/chat/completions`)
    OpenAi,
    /// Messages style (`/v1/messages`)
    Anthropic,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::OpenAi => write!(f, "openai"),
            Dialect::Anthropic => write!(f, "anthropic"),
        }
    }
}

/// OAuth provider type tag, used to pick an outbound shaping profile
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OAuthProviderType {
    ClaudeCode,
    Gemini,
    Qwen,
    Other(String),
}

impl From<String> for OAuthProviderType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "claude_code" => Self::ClaudeCode,
            "gemini" => Self::Gemini,
            "qwen" => Self::Qwen,
            _ => Self::Other(tag),
        }
    }
}

impl From<OAuthProviderType> for String {
    fn from(tag: OAuthProviderType) -> Self {
        tag.to_string()
    }
}

impl fmt::Display for OAuthProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClaudeCode => write!(f, "claude_code"),
            Self::Gemini => write!(f, "gemini"),
            Self::Qwen => write!(f, "qwen"),
            Self::Other(tag) => write!(f, "{}", tag),
        }
    }
}

/// One upstream provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCredential {
    pub name: String,
    pub api_base: String,
    pub api_style: Dialect,
    pub token: String,
    /// Set when `token` is an already-issued OAuth access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_provider: Option<OAuthProviderType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl ProviderCredential {
    /// Whether outbound calls should receive OAuth shaping
    pub fn is_oauth(&self) -> bool {
        self.oauth_provider.is_some()
    }

    /// Proxy URL, with an empty string meaning "none"
    pub fn proxy(&self) -> &str {
        self.proxy_url.as_deref().unwrap_or("")
    }
}

/// Read API over the provider records
pub trait ProviderLookup: Send + Sync {
    /// Get a provider record by name
    fn get_provider(&self, name: &str) -> Option<&ProviderCredential>;

    /// All provider records, ordered by name
    fn list_providers(&self) -> Vec<&ProviderCredential>;
}

/// On-disk layout of the provider file
#[derive(Debug, Default, Deserialize)]
struct ProviderFile {
    #[serde(default)]
    providers: Vec<ProviderCredential>,
}

/// Immutable in-memory provider store
#[derive(Debug, Default)]
pub struct ProviderStore {
    providers: BTreeMap<String, ProviderCredential>,
}

impl ProviderStore {
    /// Build a store from provider records
    pub fn new(providers: impl IntoIterator<Item = ProviderCredential>) -> Self {
        Self {
            providers: providers
                .into_iter()
                .map(|p| (p.name.clone(), p))
                .collect(),
        }
    }

    /// Parse a store from YAML text
    pub fn from_yaml(text: &str) -> Result<Self> {
        let file: ProviderFile =
            serde_yaml::from_str(text).context("Invalid provider file")?;
        Ok(Self::new(file.providers))
    }

    /// Load a store from a YAML file; a missing file yields an empty store
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!(path = %path.display(), "Provider file not found, starting with no providers");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&text)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl ProviderLookup for ProviderStore {
    fn get_provider(&self, name: &str) -> Option<&ProviderCredential> {
        self.providers.get(name)
    }

    fn list_providers(&self) -> Vec<&ProviderCredential> {
        self.providers.values().collect()
    }
}

/// Provider and upstream model selected for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRoute {
    pub provider: String,
    pub upstream_model: String,
}

/// Split an inbound model name into provider and upstream model.
///
/// `provider/model` selects `provider` when it is configured; anything else is
/// forwarded verbatim to the default provider.
pub fn route_model(
    lookup: &dyn ProviderLookup,
    default_provider: Option<&str>,
    model: &str,
) -> Option<ModelRoute> {
    if let Some((prefix, rest)) = model.split_once('/') {
        if !rest.is_empty() && lookup.get_provider(prefix).is_some() {
            return Some(ModelRoute {
                provider: prefix.to_string(),
                upstream_model: rest.to_string(),
            });
        }
    }

    default_provider.map(|provider| ModelRoute {
        provider: provider.to_string(),
        upstream_model: model.to_string(),
    })
}
