//! Upload route: replace the conversation set from a CSV, Excel or JSON export.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use tracing::info;

use agrireview_core::Error;
use agrireview_ingest::Ingester;

use crate::error::error_response;
use crate::state::AppState;

/// Largest accepted upload.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload", post(upload_file))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// POST /upload: multipart file; stores its negative-feedback rows.
async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return error_response(&Error::Ingest(e.to_string())),
        };
        let filename = match field.file_name() {
            Some(name) => name.to_string(),
            None => continue,
        };

        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return error_response(&Error::Ingest(e.to_string())),
        };
        info!("Upload received: {} ({} bytes)", filename, bytes.len());

        return match Ingester::new(&state.store).ingest_bytes(&filename, &bytes) {
            Ok(count) => (StatusCode::OK, Json(serde_json::json!({ "count": count }))),
            Err(e) => error_response(&e),
        };
    }

    error_response(&Error::Validation("no file field in upload".to_string()))
}
