//! Error → HTTP response mapping
//!
//! Every `ControlPlaneError` maps to one status and a stable code. Details
//! of infrastructure faults stay in the logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use utoipa::ToSchema;

use crate::shared::ControlPlaneError;

/// Error envelope; same shape as `ApiResponse` plus a machine-readable code.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    #[schema(value_type = Option<Object>)]
    pub data: Option<serde_json::Value>,
    pub error: String,
    /// e.g. `QUOTA_EXCEEDED`
    pub code: String,
    /// Structured details, present for quota errors
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub params: Option<serde_json::Value>,
}

impl ControlPlaneError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCredential | Self::InvalidBearerToken | Self::InvalidApiKey => {
                StatusCode::UNAUTHORIZED
            }
            Self::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            Self::QuotaExceeded { .. } => StatusCode::PAYMENT_REQUIRED,
            Self::EntityNotFound { .. } => StatusCode::NOT_FOUND,
            Self::ConfigurationInvalid { .. }
            | Self::LockTimeout { .. }
            | Self::Database(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ControlPlaneError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, code = self.code(), "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let params = match &self {
            Self::QuotaExceeded { metric, quota } => Some(json!({
                "metric": metric,
                "quota": quota,
            })),
            _ => None,
        };

        let body = ErrorResponse {
            success: false,
            data: None,
            error: message,
            code: self.code().to_string(),
            params,
        };

        (status, Json(body)).into_response()
    }
}
