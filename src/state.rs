//! Shared application state injected into handlers and middleware.

use axum::http::HeaderMap;
use std::sync::Arc;

use crate::application::services::{LinkService, RateLimiter};
use crate::domain::identity::IdentityService;
use crate::utils::request::request_base_url;

/// State shared by every request.
///
/// Cloning is cheap: services are behind [`Arc`].
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub rate_limiter: Arc<RateLimiter>,
    pub identity: Arc<dyn IdentityService>,
    /// Prefix of generated short URLs. Derived from the request when unset.
    pub base_url: Option<String>,
    /// Use the first `X-Forwarded-For` entry as the client identity.
    pub trust_forwarded_for: bool,
}

impl AppState {
    /// Prefix for short URLs built during this request, without a trailing slash.
    pub fn short_url_base(&self, headers: &HeaderMap) -> String {
        self.base_url
            .clone()
            .or_else(|| request_base_url(headers))
            .unwrap_or_default()
            .trim_end_matches('/')
            .to_string()
    }

    /// Full short URL for `slug`.
    pub fn short_url(&self, headers: &HeaderMap, slug: &str) -> String {
        format!("{}/{}", self.short_url_base(headers), slug)
    }
}
