//! Creation-time invariants for sessions and messages.
//!
//! Both checks run before anything is persisted, so a rejected request never
//! leaves a record behind. Later mutations (read, clear) are not re-checked.

use duochat_types::chat::{ChatSession, ParticipantPair};
use duochat_types::error::ChatError;
use duochat_types::identity::UserId;

/// Reject a session whose two sides are the same identity.
pub fn validate_participants(u: &UserId, v: &UserId) -> Result<ParticipantPair, ChatError> {
    let pair = ParticipantPair::new(u, v);
    if pair.is_degenerate() {
        return Err(ChatError::InvalidParticipants(u.clone()));
    }
    Ok(pair)
}

/// Reject a message whose author is not one of the session's participants.
pub fn validate_author(session: &ChatSession, author: &UserId) -> Result<(), ChatError> {
    if !session.has_participant(author) {
        return Err(ChatError::InvalidAuthor {
            author: author.clone(),
            session_id: session.id,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    #[test]
    fn test_identical_participants_rejected() {
        let err = validate_participants(&user("alice"), &user("alice")).unwrap_err();
        assert!(matches!(err, ChatError::InvalidParticipants(ref u) if u.as_str() == "alice"));
    }

    #[test]
    fn test_distinct_participants_normalized() {
        let pair = validate_participants(&user("zed"), &user("amy")).unwrap();
        assert_eq!(pair.low().as_str(), "amy");
        assert_eq!(pair.high().as_str(), "zed");
    }

    #[test]
    fn test_whitespace_distinct_tokens_form_a_pair() {
        let pair = validate_participants(&user("bob "), &user("bob")).unwrap();
        assert_eq!(pair.low().as_str(), "bob");
        assert_eq!(pair.high().as_str(), "bob ");
    }

    #[test]
    fn test_author_must_participate() {
        let session = ChatSession::new(user("alice"), user("bob"));
        assert!(validate_author(&session, &user("alice")).is_ok());
        assert!(validate_author(&session, &user("bob")).is_ok());

        let err = validate_author(&session, &user("eve")).unwrap_err();
        assert!(matches!(
            err,
            ChatError::InvalidAuthor { ref author, session_id } if author.as_str() == "eve" && session_id == session.id
        ));
    }
}
