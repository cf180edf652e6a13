//! Per-message HTTP handlers.
//!
//! Endpoints:
//! - POST /api/v1/messages/{id}/read  - Mark one message read
//! - POST /api/v1/messages/{id}/clear - Hide a message from the caller's side

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use duochat_types::chat::ChatMessage;

use super::{parse_uuid, session_for_caller};
use crate::http::error::AppError;
use crate::http::extractors::user::CallerId;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/messages/{id}/read - Mark a message read. Repeating is harmless.
pub async fn mark_read(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    Path(message_id): Path<String>,
) -> Result<Json<ApiResponse<ChatMessage>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let mid = parse_uuid(&message_id)?;
    let message = state.chat_service.get_message(&mid).await?;
    session_for_caller(&state, &message.session_id, &caller).await?;

    state.chat_service.mark_read(&mid).await?;
    let message = state.chat_service.get_message(&mid).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(message, request_id, elapsed);

    Ok(Json(resp))
}

/// POST /api/v1/messages/{id}/clear - Clear a message for the caller only.
///
/// The author clears the sender side; the counterpart clears the receiver side.
pub async fn clear_message(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    Path(message_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let mid = parse_uuid(&message_id)?;
    let side = state.chat_service.clear_for(&mid, &caller).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(
        serde_json::json!({ "message_id": mid, "cleared": side }),
        request_id,
        elapsed,
    );

    Ok(Json(resp))
}
