//! Mapping of core errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use agrireview_core::Error;

/// Status code and JSON body for a failed request.
pub fn error_response(e: &Error) -> (StatusCode, Json<serde_json::Value>) {
    let (status, summary) = match e {
        Error::DataUnavailable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Could not read conversation table",
        ),
        Error::NotFound(_) => (StatusCode::NOT_FOUND, "Conversation not found"),
        Error::Validation(_) => (StatusCode::BAD_REQUEST, "Invalid request"),
        Error::Ingest(_) => (StatusCode::BAD_REQUEST, "Failed to parse file"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
    };
    if status.is_server_error() {
        error!("{}: {}", summary, e);
    }
    (
        status,
        Json(serde_json::json!({
            "error": summary,
            "detail": e.to_string(),
        })),
    )
}

/// Handler error wrapper so routes can use `?` on store results.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error_response(&self.0).into_response()
    }
}
