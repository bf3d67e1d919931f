//! Proxy-aware HTTP client construction
//!
//! A provider may route its traffic through an HTTP(S) forward proxy or a
//! SOCKS5 proxy. Proxy misconfiguration never blocks a call: anything that
//! cannot be honoured degrades to the direct client with a warning.

use std::time::Duration;

use reqwest::{Client, Proxy, Url};
use tracing::{debug, warn};

use crate::routes::metrics::record_transport_fallback;

/// Port assumed for a SOCKS5 URL that does not name one
const DEFAULT_SOCKS5_PORT: u16 = 1080;

/// Where outbound connections for a provider are dialed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyRoute {
    /// Connect to the upstream directly
    Direct,
    /// Tunnel through an HTTP or HTTPS forward proxy
    Forward(Url),
    /// Dial through a SOCKS5 proxy at `host:port`, without credentials.
    /// Target hostnames are resolved by the proxy.
    Socks5 { host: String },
}

/// Resolve a configured proxy URL into a route.
///
/// Empty, unparseable and unsupported URLs all resolve to [`ProxyRoute::Direct`].
pub fn resolve_proxy(proxy_url: &str) -> ProxyRoute {
    if proxy_url.is_empty() {
        return ProxyRoute::Direct;
    }

    let parsed = match Url::parse(proxy_url) {
        Ok(url) => url,
        Err(e) => {
            warn!(proxy_url = %proxy_url, error = %e, "Failed to parse proxy URL, using direct client");
            record_transport_fallback();
            return ProxyRoute::Direct;
        }
    };

    match parsed.scheme() {
        "http" | "https" => ProxyRoute::Forward(parsed),
        "socks5" => match parsed.host_str().filter(|host| !host.is_empty()) {
            Some(host) => ProxyRoute::Socks5 {
                host: format!("{}:{}", host, parsed.port().unwrap_or(DEFAULT_SOCKS5_PORT)),
            },
            None => {
                warn!(proxy_url = %proxy_url, "SOCKS5 proxy URL has no host, using direct client");
                record_transport_fallback();
                ProxyRoute::Direct
            }
        },
        scheme => {
            warn!(
                scheme = %scheme,
                "Unsupported proxy scheme, supported schemes are http, https, socks5; using direct client"
            );
            record_transport_fallback();
            ProxyRoute::Direct
        }
    }
}

/// Build the HTTP client for a provider's proxy URL.
pub fn build_http_client(proxy_url: &str) -> Client {
    let route = resolve_proxy(proxy_url);
    if route != ProxyRoute::Direct {
        debug!(route = ?route, "Building proxied upstream client");
    }

    match client_for_route(&route) {
        Ok(client) => client,
        Err(e) => {
            warn!(route = ?route, error = %e, "Failed to set up proxy, using direct client");
            record_transport_fallback();
            direct_client()
        }
    }
}

fn base_builder() -> reqwest::ClientBuilder {
    Client::builder()
        .pool_max_idle_per_host(100)
        .connect_timeout(Duration::from_secs(30))
}

fn client_for_route(route: &ProxyRoute) -> Result<Client, reqwest::Error> {
    let builder = match route {
        ProxyRoute::Direct => base_builder(),
        ProxyRoute::Forward(url) => base_builder().proxy(Proxy::all(url.as_str())?),
        ProxyRoute::Socks5 { host } => {
            base_builder().proxy(Proxy::all(format!("socks5h://{}", host))?)
        }
    };
    builder.build()
}

fn direct_client() -> Client {
    base_builder().build().unwrap_or_else(|_| Client::new())
}
