//! DTOs for the delete endpoint.

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::application::services::DeleteReport;
use crate::error::AppError;

/// Request to delete one of the caller's links.
#[derive(Debug, Deserialize)]
pub struct DeleteShortlinkRequest {
    #[serde(default)]
    pub id: Option<String>,
}

impl DeleteShortlinkRequest {
    /// Parses the link id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the id is missing, blank or not a UUID.
    pub fn link_id(&self) -> Result<Uuid, AppError> {
        let raw = self
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::bad_request("id is required", json!({})))?;

        Uuid::parse_str(raw)
            .map_err(|_| AppError::bad_request("id must be a UUID", json!({ "id": raw })))
    }
}

/// Result of a delete.
///
/// `cache_error` and `warnings` are present only when cleanup after the delete
/// partially failed; the link itself is gone either way.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteShortlinkResponse {
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_error: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl From<&DeleteReport> for DeleteShortlinkResponse {
    fn from(report: &DeleteReport) -> Self {
        Self {
            message: "Short link deleted successfully".to_string(),
            cache_error: report.cache_error().map(str::to_string),
            warnings: report
                .failures()
                .map(|f| {
                    format!(
                        "{} cleanup failed: {}",
                        f.step.as_str(),
                        f.error.as_deref().unwrap_or_default()
                    )
                })
                .collect(),
        }
    }
}
