//! Principal authentication middleware.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;
use serde_json::json;

use crate::{error::AppError, state::AppState};

/// Cookie carrying the principal token for browser clients.
pub const TOKEN_COOKIE: &str = "token";

/// Authenticates requests and attaches the verified
/// [`Principal`](crate::domain::entities::Principal) as a request extension.
///
/// # Token Transport
///
/// ```text
/// Authorization: Bearer <token>
/// Cookie: token=<token>
/// ```
///
/// The header wins when both are present.
///
/// # Errors
///
/// Returns `401 Unauthorized` if no token is present or the identity service
/// rejects it.
///
/// # Example
///
/// ```rust,ignore
/// let protected = Router::new()
///     .route("/user/shorten", post(shorten_user_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));
/// ```
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let token = extract_token(&mut parts).await.ok_or_else(|| {
        AppError::unauthorized(
            "Unauthorized",
            json!({ "reason": "Authorization header or token cookie is missing" }),
        )
    })?;

    let principal = st.identity.verify(&token)?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

async fn extract_token(parts: &mut Parts) -> Option<String> {
    if let Ok(AuthBearer(token)) = AuthBearer::from_request_parts(parts, &()).await
        && !token.is_empty()
    {
        return Some(token);
    }

    cookie_token(&parts.headers)
}

/// Reads the token cookie from `Cookie` headers.
fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == TOKEN_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
