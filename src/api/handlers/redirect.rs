//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a slug to its target.
///
/// # Endpoint
///
/// `GET /{slug}`
///
/// Answers `302 Found` with the target in `Location`. Cache hits never touch
/// the database; misses repair the cache. Click accounting happens in the
/// background and never delays the response.
///
/// # Errors
///
/// Returns 404 Not Found for unknown or expired slugs.
pub async fn redirect_handler(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let resolution = state.link_service.redirect(&slug).await?;

    debug!(slug = %slug, source = resolution.source.as_str(), "Redirecting");

    let location = location_header(&resolution.target)?;

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]))
}

/// Builds a `Location` value, percent-encoding targets that are not plain ASCII.
fn location_header(target: &str) -> Result<HeaderValue, AppError> {
    if let Ok(value) = HeaderValue::from_str(target) {
        return Ok(value);
    }

    Url::parse(target)
        .ok()
        .and_then(|url| HeaderValue::from_str(url.as_str()).ok())
        .ok_or_else(|| {
            AppError::internal("Stored target is not a valid URL", json!({ "target": target }))
        })
}
