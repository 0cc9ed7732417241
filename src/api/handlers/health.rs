//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse, ServiceStatus};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// A cache outage degrades the service but does not stop redirects, which
/// fall back to the database.
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let service = &state.link_service;

    let database = if service.store_healthy().await {
        CheckStatus::ok("Connected")
    } else {
        CheckStatus::failed("Database unreachable")
    };

    let cache = if service.cache_healthy().await {
        CheckStatus::ok("Connected")
    } else {
        CheckStatus::failed("Cache unreachable")
    };

    let click_queue = match service.click_queue_capacity() {
        Some(capacity) => CheckStatus::ok(format!("Capacity: {}", capacity)),
        None => CheckStatus::failed("Click queue is closed"),
    };

    let checks = HealthChecks {
        database,
        cache,
        click_queue,
    };
    let healthy = checks.all_ok();

    let response = HealthResponse {
        status: if healthy {
            ServiceStatus::Healthy
        } else {
            ServiceStatus::Degraded
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks,
    };

    if healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
