//! Header utilities for upstream calls
//!
//! Client headers are never forwarded upstream: each provider call carries only
//! the provider's own credential in the form its dialect expects.

use axum::http::header::{self, HeaderName};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use super::TransportError;
use crate::providers::Dialect;

/// Messages-dialect API version sent with every call
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Hop-by-hop headers that must never be forwarded
const HOP_BY_HOP_HEADERS: &[HeaderName] = &[
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Build the headers for a call to a provider speaking `dialect`
pub fn build_upstream_headers(dialect: Dialect, token: &str) -> Result<HeaderMap, TransportError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    match dialect {
        Dialect::OpenAi => {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| TransportError::InvalidRequest("provider token is not a valid header value".into()))?;
            headers.insert(AUTHORIZATION, value);
        }
        Dialect::Anthropic => {
            let value = HeaderValue::from_str(token)
                .map_err(|_| TransportError::InvalidRequest("provider token is not a valid header value".into()))?;
            headers.insert("x-api-key", value);
            headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        }
    }

    Ok(headers)
}

/// Check if a header is a hop-by-hop header that should not be forwarded
pub fn is_hop_by_hop_header(name: &HeaderName) -> bool {
    HOP_BY_HOP_HEADERS.contains(name)
}

/// Filter hop-by-hop headers from a response
///
/// Used when relaying a same-dialect provider response to the client.
pub fn filter_response_headers(response_headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::new();

    for (name, value) in response_headers {
        if !is_hop_by_hop_header(name) && *name != header::CONTENT_LENGTH {
            filtered.append(name.clone(), value.clone());
        }
    }

    filtered
}
