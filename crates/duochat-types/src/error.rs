use thiserror::Error;
use uuid::Uuid;

use crate::identity::UserId;

/// Errors raised by the chat engine (session registry, message store, unread queries).
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("a session needs two distinct participants, got '{0}' twice")]
    InvalidParticipants(UserId),

    #[error("user '{author}' is not a participant of session {session_id}")]
    InvalidAuthor { author: UserId, session_id: Uuid },

    #[error("user '{user}' cannot view session {session_id}")]
    NotParticipant { user: UserId, session_id: Uuid },

    #[error("session {0} not found")]
    SessionNotFound(Uuid),

    #[error("message {0} not found")]
    MessageNotFound(Uuid),

    #[error("invalid user id: '{0}'")]
    InvalidUserId(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors from repository operations (used by trait definitions in duochat-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<RepositoryError> for ChatError {
    fn from(e: RepositoryError) -> Self {
        ChatError::StorageError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        let user = UserId::new("alice").unwrap();
        let err = ChatError::InvalidParticipants(user);
        assert_eq!(
            err.to_string(),
            "a session needs two distinct participants, got 'alice' twice"
        );
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_repository_error_becomes_storage_error() {
        let err: ChatError = RepositoryError::Connection.into();
        assert!(matches!(err, ChatError::StorageError(ref msg) if msg == "database connection error"));
    }
}
