//! API route configuration.
//!
//! Routes under `/api`. Protected routes require a principal token via
//! [`crate::api::middleware::auth`].

use crate::api::handlers::{
    delete_shortlink_handler, shorten_public_handler, shorten_user_handler, user_links_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Routes that need an authenticated principal.
///
/// # Endpoints
///
/// - `POST /user/shorten`     - Create an owned, non-expiring link
/// - `GET  /user/shortlinks`  - List the caller's links (paginated)
/// - `POST /delete/shortlink` - Delete one of the caller's links
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/user/shorten", post(shorten_user_handler))
        .route("/user/shortlinks", get(user_links_handler))
        .route("/delete/shortlink", post(delete_shortlink_handler))
}

/// Routes open to anonymous callers.
///
/// # Endpoints
///
/// - `POST /publicshorturl` - Alias of `POST /shorten`
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/publicshorturl", post(shorten_public_handler))
}
