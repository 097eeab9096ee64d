use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;

/// Message returned for every server-side failure. The underlying error is
/// only logged.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

impl AppError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// API-specific error wrapper that converts AppError into HTTP responses.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            AppError::NotFound(msg) | AppError::BadRequest(msg) | AppError::Conflict(msg) => {
                serde_json::json!({ "success": false, "error": msg })
            }
            AppError::Validation(details) => serde_json::json!({
                "success": false,
                "error": "Validation failed",
                "details": details,
            }),
            other => {
                tracing::error!(error = %other, "request failed");
                serde_json::json!({ "success": false, "error": INTERNAL_ERROR_MESSAGE })
            }
        };

        (status, axum::Json(body)).into_response()
    }
}
