// --- File: crates/medportal_common/src/http.rs ---
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::{HttpStatusCode, PortalError};

/// Extension trait for PortalError to convert it to an Axum HTTP response.
pub trait IntoHttpResponse {
    /// Converts the error into an Axum HTTP response.
    fn into_http_response(self) -> Response;
}

impl IntoHttpResponse for PortalError {
    fn into_http_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Storage details stay in the logs
        let message = match &self {
            PortalError::DatabaseError(_)
            | PortalError::ConfigError(_)
            | PortalError::InternalError(_) => "Internal server error.".to_string(),
            other => other.message().to_string(),
        };

        let body = Json(json!({
            "success": false,
            "message": message,
            "code": status_code.as_u16(),
        }));

        (status_code, body).into_response()
    }
}

/// Implement IntoResponse for PortalError to make it easier to use in Axum handlers.
impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}
