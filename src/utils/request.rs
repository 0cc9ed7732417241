//! Client identity and base URL derivation from HTTP requests.

use axum::http::{HeaderMap, header};
use std::net::SocketAddr;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Derives the rate-limit identity of a client.
///
/// When `trust_forwarded` is set and an `X-Forwarded-For` header is present,
/// its first (client-most) entry wins. Otherwise the peer socket address is used.
/// Only enable `trust_forwarded` behind a proxy that overwrites the header.
///
/// # Examples
///
/// ```ignore
/// let mut headers = HeaderMap::new();
/// headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
/// let peer: SocketAddr = "10.0.0.1:5000".parse().unwrap();
///
/// assert_eq!(client_key(&headers, Some(peer), true), "203.0.113.7");
/// assert_eq!(client_key(&headers, Some(peer), false), "10.0.0.1");
/// ```
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded: bool) -> String {
    if trust_forwarded
        && let Some(first) = headers
            .get(X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    {
        return first.to_string();
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Builds `scheme://host` for the current request.
///
/// Used for short URLs when no `BASE_URL` is configured. The scheme comes from
/// `X-Forwarded-Proto` when present, otherwise `http`.
pub fn request_base_url(headers: &HeaderMap) -> Option<String> {
    let host = headers.get(header::HOST)?.to_str().ok()?;
    if host.is_empty() {
        return None;
    }

    let scheme = headers
        .get(X_FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| v == "http" || v == "https")
        .unwrap_or_else(|| "http".to_string());

    Some(format!("{}://{}", scheme, host))
}
