//! Per-client fixed-window rate limiting middleware.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::request::client_key;

/// Admits or rejects a request against the shared
/// [`RateLimiter`](crate::application::services::RateLimiter).
///
/// # Client Identity
///
/// The first `X-Forwarded-For` entry when `TRUST_FORWARDED_FOR` is enabled,
/// otherwise the peer socket address. Serve the router with
/// `into_make_service_with_connect_info::<SocketAddr>` so the peer is known.
///
/// # Errors
///
/// Returns `429 Too Many Requests` with a `Retry-After` header once the client
/// has used its budget for the current window.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/shorten", post(shorten_public_handler))
///     .layer(middleware::from_fn_with_state(state.clone(), rate_limit::layer));
/// ```
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let client = client_key(req.headers(), peer, st.trust_forwarded_for);
    let admission = st.rate_limiter.admit(&client).await;

    if !admission.allowed {
        return Err(AppError::too_many_requests(admission.retry_after_seconds));
    }

    Ok(next.run(req).await)
}
