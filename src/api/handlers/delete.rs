//! Handler for deleting a link.

use axum::{Extension, Json, extract::State};

use crate::api::dto::delete::{DeleteShortlinkRequest, DeleteShortlinkResponse};
use crate::api::extract::AppJson;
use crate::domain::entities::Principal;
use crate::error::AppError;
use crate::state::AppState;

/// Deletes one of the caller's links.
///
/// # Endpoint
///
/// `POST /api/delete/shortlink`
///
/// # Request Body
///
/// ```json
/// { "id": "8d5e0f4a-..." }
/// ```
///
/// # Behavior
///
/// The link row is removed, then its derived asset (record, cached row,
/// image file) and its redirect cache entry are cleaned up independently.
/// Cleanup failures do not fail the request; they are listed in `warnings`,
/// and a failed cache invalidation is also reported in `cache_error`.
///
/// # Errors
///
/// Returns 400 Bad Request if `id` is missing or malformed.
/// Returns 404 Not Found if the link does not exist or belongs to someone else.
pub async fn delete_shortlink_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    AppJson(payload): AppJson<DeleteShortlinkRequest>,
) -> Result<Json<DeleteShortlinkResponse>, AppError> {
    let id = payload.link_id()?;

    let report = state
        .link_service
        .delete(id, Some(&principal.user_id))
        .await?;

    Ok(Json(DeleteShortlinkResponse::from(&report)))
}
