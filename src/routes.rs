//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{slug}`   - Short link redirect (public)
//! - `POST /shorten`  - Anonymous shortening (public)
//! - `GET  /health`   - Health check: database, cache, click queue (public)
//! - `/api/*`         - REST API, see [`crate::api::routes`]
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Fixed window per client, on every route
//! - **Authentication** - Principal token on protected API routes
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler, shorten_public_handler};
use crate::api::middleware::{auth, rate_limit, tracing};
use crate::state::AppState;
use axum::routing::{get, post};
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// Rate limiting runs before authentication, so rejected tokens still count
/// against the client's budget.
pub fn router(state: AppState) -> Router {
    let api_router = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer))
        .merge(api::routes::public_routes());

    Router::new()
        .route("/shorten", post(shorten_public_handler))
        .route("/health", get(health_handler))
        .route("/{slug}", get(redirect_handler))
        .nest("/api", api_router)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::layer,
        ))
        .with_state(state)
        .layer(tracing::layer())
}

/// [`router`] with trailing slashes trimmed before routing.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}
