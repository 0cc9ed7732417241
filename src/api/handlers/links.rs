//! Handler for listing the caller's links.

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::HeaderMap,
};
use serde_json::json;

use crate::api::dto::links::{UserLinkItem, UserLinksResponse};
use crate::api::dto::pagination::PaginationParams;
use crate::domain::entities::Principal;
use crate::error::AppError;
use crate::state::AppState;

/// Lists the authenticated principal's links, newest first.
///
/// # Endpoint
///
/// `GET /api/user/shortlinks?page=1&page_size=25`
///
/// # Errors
///
/// Returns 400 Bad Request for invalid pagination.
pub async fn user_links_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<PaginationParams>,
    headers: HeaderMap,
) -> Result<Json<UserLinksResponse>, AppError> {
    let page = params
        .resolve()
        .map_err(|e| AppError::bad_request(e, json!({})))?;

    let (links, total) = state
        .link_service
        .list_for_owner(&principal.user_id, page.offset(), page.limit())
        .await?;

    let base_url = state.short_url_base(&headers);

    Ok(Json(UserLinksResponse {
        page,
        total,
        items: links
            .into_iter()
            .map(|link| UserLinkItem::from_link(link, &base_url))
            .collect(),
    }))
}
