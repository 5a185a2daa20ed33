//! Insights and health routes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use agrireview_core::Error;

use crate::error::error_response;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/insights", get(get_insights))
        .route("/health", get(get_health))
}

/// GET /insights: aggregate views, recomputed from the full record set.
async fn get_insights(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match agrireview_insights::compute_insights(&state.store) {
        Ok(snapshot) => match serde_json::to_value(&snapshot) {
            Ok(body) => (StatusCode::OK, Json(body)),
            Err(e) => error_response(&Error::from(e)),
        },
        Err(e) => error_response(&e),
    }
}

/// GET /health: liveness plus the current conversation count.
async fn get_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.count_conversations() {
        Ok(count) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ok",
                "conversations": count,
            })),
        ),
        Err(e) => error_response(&e),
    }
}
