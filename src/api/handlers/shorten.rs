//! Handlers for link shortening endpoints.

use axum::{
    Extension, Json,
    extract::State,
    http::HeaderMap,
};
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::api::extract::AppJson;
use crate::application::services::ShortenCommand;
use crate::domain::entities::Principal;
use crate::error::AppError;
use crate::state::AppState;

/// Creates an anonymous short link.
///
/// # Endpoints
///
/// `POST /shorten`, `POST /api/publicshorturl`
///
/// Anonymous links expire after the configured lifetime.
///
/// # Request Body
///
/// ```json
/// { "original_url": "example.com", "slug": "my-link" }
/// ```
///
/// # Response
///
/// ```json
/// { "slug": "my-link", "short_url": "https://sho.rt/my-link" }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request for an invalid target or slug.
/// Returns 409 Conflict if the requested slug is taken.
pub async fn shorten_public_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(payload): AppJson<ShortenRequest>,
) -> Result<Json<ShortenResponse>, AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .shorten(ShortenCommand::anonymous(payload.original_url, payload.slug))
        .await?;

    Ok(Json(ShortenResponse {
        short_url: state.short_url(&headers, &link.slug),
        slug: link.slug,
    }))
}

/// Creates a short link owned by the authenticated principal.
///
/// # Endpoint
///
/// `POST /api/user/shorten`
///
/// Same body and response as [`shorten_public_handler`]. Owned links never
/// expire.
///
/// # Errors
///
/// Returns 401 Unauthorized without a valid principal token, otherwise as
/// [`shorten_public_handler`].
pub async fn shorten_user_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    headers: HeaderMap,
    AppJson(payload): AppJson<ShortenRequest>,
) -> Result<Json<ShortenResponse>, AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .shorten(ShortenCommand::owned(
            payload.original_url,
            principal,
            payload.slug,
        ))
        .await?;

    Ok(Json(ShortenResponse {
        short_url: state.short_url(&headers, &link.slug),
        slug: link.slug,
    }))
}
