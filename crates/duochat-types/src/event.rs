//! Event types for the chat event bus.
//!
//! `ChatEvent` is what the engine publishes after a state change succeeds.
//! An external delivery layer subscribes and forwards events to live
//! connections; the engine itself never pushes anything over the network.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::{ChatMessage, ChatSession, ClearSide};
use crate::identity::UserId;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A new session was registered for a pair that had none.
    SessionCreated { session: ChatSession },

    /// A message was persisted and its session recency updated.
    MessageAppended {
        message: ChatMessage,
        /// The counterpart who should receive the message.
        recipient: UserId,
    },

    /// `reader` marked `count` messages from the counterpart as read.
    MessagesRead {
        session_id: Uuid,
        reader: UserId,
        count: u64,
    },

    /// A message was soft-cleared from one side's view.
    MessageCleared {
        message_id: Uuid,
        session_id: Uuid,
        side: ClearSide,
    },
}

impl ChatEvent {
    /// Session the event belongs to.
    pub fn session_id(&self) -> Uuid {
        match self {
            ChatEvent::SessionCreated { session } => session.id,
            ChatEvent::MessageAppended { message, .. } => message.session_id,
            ChatEvent::MessagesRead { session_id, .. } => *session_id,
            ChatEvent::MessageCleared { session_id, .. } => *session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = ChatEvent::MessagesRead {
            session_id: Uuid::now_v7(),
            reader: UserId::new("bob").unwrap(),
            count: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "messages_read");
        assert_eq!(json["reader"], "bob");
        assert_eq!(json["count"], 3);
    }

    #[test]
    fn test_event_session_id() {
        let session = ChatSession::new(UserId::new("a").unwrap(), UserId::new("b").unwrap());
        let id = session.id;
        assert_eq!(ChatEvent::SessionCreated { session }.session_id(), id);
    }
}
