//! Conversation review routes: list, fetch, delete, answer, reset.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use agrireview_core::{ConversationRecord, ConversationStatus, Error};
use agrireview_store::ConversationFilter;

use crate::error::{error_response, ApiError};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/conversations", get(list_conversations))
        .route(
            "/conversations/{id}",
            get(get_conversation).delete(delete_conversation),
        )
        .route("/answer", post(post_answer))
        .route("/admin/reset", post(admin_reset))
}

/// Record JSON plus `index`, the id under the name the review UI uses.
fn conversation_json(record: &ConversationRecord) -> Result<serde_json::Value, ApiError> {
    let mut value = serde_json::to_value(record).map_err(Error::from)?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert("index".to_string(), record.id.into());
    }
    Ok(value)
}

#[derive(Debug, Deserialize)]
struct ListConversationsQuery {
    /// `Open`, `Closed` or `All`.
    status: Option<String>,
    bot: Option<String>,
    /// Substring of the user message.
    q: Option<String>,
}

impl ListConversationsQuery {
    fn into_filter(self) -> Result<ConversationFilter, Error> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) if s.eq_ignore_ascii_case("all") => None,
            Some(s) if s.eq_ignore_ascii_case("open") => Some(ConversationStatus::Open),
            Some(s) if s.eq_ignore_ascii_case("closed") => Some(ConversationStatus::Closed),
            Some(other) => {
                return Err(Error::Validation(format!("unknown status filter: {}", other)))
            }
        };
        Ok(ConversationFilter {
            status,
            bot: self.bot,
            text: self.q,
        })
    }
}

/// GET /conversations: stored conversations, optionally filtered.
async fn list_conversations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListConversationsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let filter = params.into_filter()?;
    let records = state.store.list_conversations(&filter)?;
    let rows = records
        .iter()
        .map(conversation_json)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(serde_json::json!({
        "count": rows.len(),
        "rows": rows,
    })))
}

/// GET /conversations/:id
async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match state.store.get_conversation(id)? {
        Some(record) => Ok(Json(conversation_json(&record)?)),
        None => Err(Error::NotFound(format!("conversation {}", id)).into()),
    }
}

/// DELETE /conversations/:id
async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.store.delete_conversation(id) {
        Ok(true) => (
            StatusCode::OK,
            Json(serde_json::json!({ "deleted": true, "id": id })),
        ),
        Ok(false) => error_response(&Error::NotFound(format!("conversation {}", id))),
        Err(e) => error_response(&e),
    }
}

#[derive(Debug, Deserialize)]
struct AnswerPayload {
    index: i64,
    expert_answer: String,
}

/// POST /answer: attach an expert answer and close the conversation.
async fn post_answer(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AnswerPayload>,
) -> impl IntoResponse {
    match state
        .store
        .record_expert_answer(payload.index, &payload.expert_answer)
    {
        Ok(answer_id) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ok", "id": answer_id })),
        ),
        Err(e) => error_response(&e),
    }
}

/// POST /admin/reset: clear all conversations and answers.
async fn admin_reset(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.reset() {
        Ok(()) => {
            info!("Admin reset requested");
            (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
        }
        Err(e) => error_response(&e),
    }
}
