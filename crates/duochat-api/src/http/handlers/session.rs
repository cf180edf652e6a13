//! Session and conversation HTTP handlers.
//!
//! Endpoints:
//! - POST /api/v1/sessions                - Open (or reuse) a session with another user
//! - GET  /api/v1/sessions                - Caller's conversation list
//! - GET  /api/v1/sessions/{id}           - Get a single session
//! - GET  /api/v1/sessions/{id}/messages  - Messages visible to the caller, newest first
//! - POST /api/v1/sessions/{id}/messages  - Append a message as the caller
//! - POST /api/v1/sessions/{id}/read      - Mark the counterpart's messages read

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use futures_util::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use duochat_types::chat::{ChatMessage, ChatSession, SessionOutcome, SessionOverview};
use duochat_types::identity::UserId;

use super::{parse_uuid, session_for_caller};
use crate::http::error::AppError;
use crate::http::extractors::user::CallerId;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for opening a session.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// The other participant.
    pub with: UserId,
}

/// Request body for appending a message.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub payload: serde_json::Value,
}

/// Query parameters for message listing.
#[derive(Debug, Deserialize)]
pub struct MessageListQuery {
    pub limit: Option<usize>,
}

/// A session with the channel name delivery layers group connections under.
#[derive(Debug, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: ChatSession,
    pub room: String,
}

impl From<ChatSession> for SessionView {
    fn from(session: ChatSession) -> Self {
        let room = session.room_name();
        Self { session, room }
    }
}

/// POST /api/v1/sessions - Create the session with `with`, or return the existing one.
///
/// Responds 201 when a session was created and 200 when it already existed.
pub async fn create_session(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    Json(body): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SessionOutcome>>), AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let outcome = state.chat_service.create_if_absent(&caller, &body.with).await?;
    let status = if outcome.was_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let session_id = outcome.session().id;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(outcome, request_id, elapsed)
        .with_link("self", &format!("/api/v1/sessions/{session_id}"))
        .with_link("messages", &format!("/api/v1/sessions/{session_id}/messages"));

    Ok((status, Json(resp)))
}

/// GET /api/v1/sessions - Conversation list for the caller, most recent first.
pub async fn list_sessions(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
) -> Result<Json<ApiResponse<Vec<SessionOverview>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sessions = state.chat_service.list_sessions_for_user(&caller).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(sessions, request_id, elapsed).with_link("self", "/api/v1/sessions");

    Ok(Json(resp))
}

/// GET /api/v1/sessions/{id} - Get a session the caller participates in.
pub async fn get_session(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<SessionView>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_uuid(&session_id)?;
    let session = session_for_caller(&state, &sid, &caller).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(SessionView::from(session), request_id, elapsed)
        .with_link("self", &format!("/api/v1/sessions/{sid}"))
        .with_link("messages", &format!("/api/v1/sessions/{sid}/messages"));

    Ok(Json(resp))
}

/// GET /api/v1/sessions/{id}/messages - Messages visible to the caller, newest first.
///
/// `limit` is capped at the configured page limit.
pub async fn list_messages(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    Path(session_id): Path<String>,
    Query(query): Query<MessageListQuery>,
) -> Result<Json<ApiResponse<Vec<ChatMessage>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_uuid(&session_id)?;
    let max = state.config.message_page_limit;
    let limit = query.limit.unwrap_or(max).min(max);

    let messages: Vec<ChatMessage> = state
        .chat_service
        .list_visible_to(&sid, &caller)
        .await?
        .take(limit)
        .try_collect()
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(messages, request_id, elapsed)
        .with_link("self", &format!("/api/v1/sessions/{sid}/messages"))
        .with_link("session", &format!("/api/v1/sessions/{sid}"));

    Ok(Json(resp))
}

/// POST /api/v1/sessions/{id}/messages - Append a message authored by the caller.
pub async fn send_message(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    Path(session_id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ChatMessage>>), AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_uuid(&session_id)?;
    let message = state.chat_service.append(&sid, &caller, body.payload).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let message_id = message.id;
    let resp = ApiResponse::success(message, request_id, elapsed)
        .with_link("session", &format!("/api/v1/sessions/{sid}"))
        .with_link("read", &format!("/api/v1/messages/{message_id}/read"));

    Ok((StatusCode::CREATED, Json(resp)))
}

/// POST /api/v1/sessions/{id}/read - Mark every counterpart message read.
pub async fn mark_session_read(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_uuid(&session_id)?;
    session_for_caller(&state, &sid, &caller).await?;
    let updated = state.chat_service.mark_all_read_in_session(&sid, &caller).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(
        serde_json::json!({ "session_id": sid, "updated": updated }),
        request_id,
        elapsed,
    )
    .with_link("session", &format!("/api/v1/sessions/{sid}"));

    Ok(Json(resp))
}
