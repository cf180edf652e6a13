//! HTTP request handlers for the REST API.

pub mod message;
pub mod presence;
pub mod session;
pub mod unread;

use uuid::Uuid;

use duochat_types::chat::ChatSession;
use duochat_types::error::ChatError;
use duochat_types::identity::UserId;

use crate::http::error::AppError;
use crate::state::AppState;

/// Parse a UUID from a path parameter, returning a 400 error on invalid format.
fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    s.parse::<Uuid>()
        .map_err(|_| AppError::Validation(format!("Invalid UUID: {s}")))
}

/// Load a session and require `caller` to be one of its participants.
async fn session_for_caller(
    state: &AppState,
    session_id: &Uuid,
    caller: &UserId,
) -> Result<ChatSession, AppError> {
    let session = state.chat_service.get_session(session_id).await?;
    if !session.has_participant(caller) {
        return Err(ChatError::NotParticipant {
            user: caller.clone(),
            session_id: session.id,
        }
        .into());
    }
    Ok(session)
}
