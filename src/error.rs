//! Application error taxonomy and its HTTP rendering.
//!
//! Every failure reaching a handler is an [`AppError`]. Cache faults never get
//! here: they are [`crate::infrastructure::cache::CacheError`]s and are absorbed
//! by the services that talk to the cache.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Machine-readable error payload returned to clients.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed or missing input. Never retried.
    #[error("{message}")]
    Validation { message: String, details: Value },

    /// Missing or invalid principal token.
    #[error("{message}")]
    Unauthorized { message: String, details: Value },

    /// Unknown slug or id.
    #[error("{message}")]
    NotFound { message: String, details: Value },

    /// Slug already in use.
    #[error("{message}")]
    Conflict { message: String, details: Value },

    /// No free slug found within the retry bound.
    #[error("{message}")]
    Exhausted { message: String, details: Value },

    /// Client exceeded its request budget for the current window.
    #[error("{message}")]
    TooManyRequests { message: String, retry_after: u64 },

    /// Unexpected store failure.
    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }
    pub fn exhausted(message: impl Into<String>, details: Value) -> Self {
        Self::Exhausted {
            message: message.into(),
            details,
        }
    }
    pub fn too_many_requests(retry_after: u64) -> Self {
        Self::TooManyRequests {
            message: "too many requests".to_string(),
            retry_after,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Returns true for errors caused by the client rather than the service.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Internal { .. } | Self::Exhausted { .. })
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Exhausted { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_error_info(&self) -> ErrorInfo {
        let (code, message, details) = match self {
            Self::Validation { message, details } => ("validation_error", message, details.clone()),
            Self::Unauthorized { message, details } => ("unauthorized", message, details.clone()),
            Self::NotFound { message, details } => ("not_found", message, details.clone()),
            Self::Conflict { message, details } => ("conflict", message, details.clone()),
            Self::Exhausted { message, details } => {
                ("slug_space_exhausted", message, details.clone())
            }
            Self::TooManyRequests {
                message,
                retry_after,
            } => (
                "too_many_requests",
                message,
                json!({ "retry_after": retry_after }),
            ),
            Self::Internal { message, details } => ("internal_error", message, details.clone()),
        };

        ErrorInfo {
            code,
            message: message.clone(),
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let Self::TooManyRequests { retry_after, .. } = &self {
            let retry_after = *retry_after;
            let mut response = (
                status,
                Json(json!({ "error": "too many requests", "retry_after": retry_after })),
            )
                .into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
            return response;
        }

        if !self.is_client_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let mut response = (
            status,
            Json(ErrorBody {
                error: self.to_error_info(),
            }),
        )
            .into_response();

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        map_sqlx_error(e)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::bad_request(
            "Invalid input",
            serde_json::to_value(e.field_errors()).unwrap_or_default(),
        )
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::bad_request(
            "Invalid request body",
            json!({ "reason": rejection.body_text() }),
        )
    }
}

pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error()
        && db.is_unique_violation()
    {
        return AppError::conflict(
            "Unique constraint violation",
            json!({ "constraint": db.constraint() }),
        );
    }

    tracing::error!(error = %e, "Database error");
    AppError::internal("Database error", json!({}))
}
