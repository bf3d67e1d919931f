//! Proxy module
//!
//! Builds the outbound side of a request: one customized HTTP client per
//! upstream provider (proxy tunneling plus optional OAuth request shaping).

pub mod client;
pub mod headers;
pub mod oauth;
pub mod transport;

use thiserror::Error;

pub use client::{ProviderClient, ProviderClients};
pub use oauth::{HookError, OAuthProfile, OAuthProfiles, RequestHook};
pub use transport::{build_http_client, resolve_proxy, ProxyRoute};

/// Errors raised while preparing or sending one outbound request
#[derive(Debug, Error)]
pub enum TransportError {
    /// A shaping hook refused the request before dispatch
    #[error("Request hook failed: {0}")]
    Hook(#[from] HookError),

    /// The outbound request could not be built
    #[error("Invalid upstream request: {0}")]
    InvalidRequest(String),

    /// The upstream could not be reached
    #[error("Upstream request failed: {0}")]
    Http(#[from] reqwest::Error),
}
