//! Presence HTTP handlers.
//!
//! Endpoints:
//! - PUT /api/v1/presence        - Set the caller's online flag
//! - GET /api/v1/presence/{user} - Read a user's online flag

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;

use duochat_core::presence::PresenceRepository;
use duochat_types::error::ChatError;
use duochat_types::identity::UserId;
use duochat_types::presence::UserPresence;

use crate::http::error::AppError;
use crate::http::extractors::user::CallerId;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for updating presence.
#[derive(Debug, Deserialize)]
pub struct SetPresenceRequest {
    pub online: bool,
}

/// PUT /api/v1/presence - Set the caller's online flag.
pub async fn set_presence(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    Json(body): Json<SetPresenceRequest>,
) -> Result<Json<ApiResponse<UserPresence>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let presence = state
        .presence_repo
        .set_online(&caller, body.online)
        .await
        .map_err(ChatError::from)?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(presence, request_id, elapsed)
        .with_link("self", &format!("/api/v1/presence/{caller}"));

    Ok(Json(resp))
}

/// GET /api/v1/presence/{user} - Read a user's online flag (offline if never set).
pub async fn get_presence(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<ApiResponse<UserPresence>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let user = UserId::new(user)?;
    let presence = state
        .presence_repo
        .get_presence(&user)
        .await
        .map_err(ChatError::from)?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(presence, request_id, elapsed);

    Ok(Json(resp))
}
