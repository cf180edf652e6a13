//! Unread count handler.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use uuid::Uuid;

use crate::http::error::AppError;
use crate::http::extractors::user::CallerId;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/unread - Total unread messages addressed to the caller.
pub async fn get_unread(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let unread = state.chat_service.count_unread_for_user(&caller).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(
        serde_json::json!({ "user_id": caller, "unread": unread }),
        request_id,
        elapsed,
    )
    .with_link("sessions", "/api/v1/sessions");

    Ok(Json(resp))
}
