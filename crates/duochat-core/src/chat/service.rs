//! Chat service: the session registry, message store, and unread aggregator.
//!
//! `ChatService` enforces the creation-time invariants from `validation`,
//! translates storage errors into `ChatError`, and publishes a `ChatEvent`
//! after every committed state change.

use std::pin::Pin;

use futures_util::{Stream, TryStreamExt};
use tracing::{debug, info};
use uuid::Uuid;

use duochat_types::chat::{
    ChatMessage, ChatSession, ClearSide, ParticipantPair, SessionOutcome, SessionOverview,
};
use duochat_types::error::{ChatError, RepositoryError};
use duochat_types::event::ChatEvent;
use duochat_types::identity::UserId;

use crate::chat::repository::ChatRepository;
use crate::chat::validation::{validate_author, validate_participants};
use crate::event::EventBus;

/// Messages of one session, newest first.
pub type ChatMessageStream =
    Pin<Box<dyn Stream<Item = Result<ChatMessage, ChatError>> + Send + 'static>>;

/// Orchestrates session lifecycle, message state, and unread counts.
///
/// Generic over `ChatRepository`; duochat-infra supplies the SQLite implementation.
pub struct ChatService<C: ChatRepository> {
    chat_repo: C,
    events: EventBus,
}

impl<C: ChatRepository> ChatService<C> {
    /// Create a new chat service publishing into `events`.
    pub fn new(chat_repo: C, events: EventBus) -> Self {
        Self { chat_repo, events }
    }

    /// Access the chat repository.
    pub fn chat_repo(&self) -> &C {
        &self.chat_repo
    }

    /// Access the event bus (subscribe here to observe committed changes).
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // --- Session registry ---

    /// Find the session between `u` and `v`, in either order.
    pub async fn find_session(
        &self,
        u: &UserId,
        v: &UserId,
    ) -> Result<Option<ChatSession>, ChatError> {
        let pair = ParticipantPair::new(u, v);
        Ok(self.chat_repo.find_session(&pair).await?)
    }

    /// Return the session between `u` and `v`, creating it if none exists.
    ///
    /// `u` is recorded as the initiator of a newly created session. Fails with
    /// `InvalidParticipants` when `u == v`; nothing is written in that case.
    pub async fn create_if_absent(
        &self,
        u: &UserId,
        v: &UserId,
    ) -> Result<SessionOutcome, ChatError> {
        let pair = validate_participants(u, v)?;

        if let Some(existing) = self.chat_repo.find_session(&pair).await? {
            return Ok(SessionOutcome::Existing(existing));
        }

        let outcome = self
            .chat_repo
            .create_session_if_absent(&ChatSession::new(u.clone(), v.clone()))
            .await?;

        if let SessionOutcome::Created(session) = &outcome {
            info!(session_id = %session.id, a = %session.participant_a, b = %session.participant_b, "Session created");
            self.events.publish(ChatEvent::SessionCreated {
                session: session.clone(),
            });
        }

        Ok(outcome)
    }

    /// Get a session by ID.
    pub async fn get_session(&self, session_id: &Uuid) -> Result<ChatSession, ChatError> {
        self.chat_repo
            .get_session(session_id)
            .await?
            .ok_or(ChatError::SessionNotFound(*session_id))
    }

    /// Bump the session's `last_activity_at` to now.
    pub async fn touch(&self, session_id: &Uuid) -> Result<(), ChatError> {
        self.chat_repo
            .touch_session(session_id, duochat_types::chat::timestamp_now())
            .await
            .map_err(|e| session_error(e, session_id))
    }

    /// Conversation list for `user`, most recently active first.
    pub async fn list_sessions_for_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<SessionOverview>, ChatError> {
        Ok(self.chat_repo.list_sessions_for_user(user).await?)
    }

    // --- Message store ---

    /// Append a message authored by `author` to an existing session.
    ///
    /// The message is persisted and the session touched as one unit before
    /// this returns; a `MessageAppended` event follows for the counterpart.
    pub async fn append(
        &self,
        session_id: &Uuid,
        author: &UserId,
        payload: serde_json::Value,
    ) -> Result<ChatMessage, ChatError> {
        let session = self.get_session(session_id).await?;
        validate_author(&session, author)?;

        let message = ChatMessage::new(session.id, author.clone(), payload);
        self.chat_repo
            .append_message(&message)
            .await
            .map_err(|e| session_error(e, session_id))?;

        debug!(session_id = %session.id, message_id = %message.id, author = %author, "Message appended");

        if let Some(recipient) = session.counterpart(author) {
            self.events.publish(ChatEvent::MessageAppended {
                message: message.clone(),
                recipient: recipient.clone(),
            });
        }

        Ok(message)
    }

    /// Resolve (or create) the session between `from` and `to`, then append.
    pub async fn send(
        &self,
        from: &UserId,
        to: &UserId,
        payload: serde_json::Value,
    ) -> Result<ChatMessage, ChatError> {
        let session = self.create_if_absent(from, to).await?.into_session();
        self.append(&session.id, from, payload).await
    }

    /// Get a message by ID.
    pub async fn get_message(&self, message_id: &Uuid) -> Result<ChatMessage, ChatError> {
        self.chat_repo
            .get_message(message_id)
            .await?
            .ok_or(ChatError::MessageNotFound(*message_id))
    }

    /// Mark one message read. Re-marking a read message succeeds.
    pub async fn mark_read(&self, message_id: &Uuid) -> Result<(), ChatError> {
        self.chat_repo
            .mark_read(message_id)
            .await
            .map_err(|e| message_error(e, message_id))
    }

    /// Mark every unread message in the session not authored by `excluding_author`.
    ///
    /// This is how a viewer acknowledges the counterpart's messages; their own
    /// messages are never touched. Returns the number of messages updated.
    pub async fn mark_all_read_in_session(
        &self,
        session_id: &Uuid,
        excluding_author: &UserId,
    ) -> Result<u64, ChatError> {
        let session = self.get_session(session_id).await?;
        let count = self
            .chat_repo
            .mark_all_read(&session.id, excluding_author)
            .await?;

        if count > 0 {
            debug!(session_id = %session.id, reader = %excluding_author, count, "Messages marked read");
            self.events.publish(ChatEvent::MessagesRead {
                session_id: session.id,
                reader: excluding_author.clone(),
                count,
            });
        }

        Ok(count)
    }

    /// Hide a message from its author's view.
    pub async fn mark_sender_cleared(&self, message_id: &Uuid) -> Result<(), ChatError> {
        let message = self.get_message(message_id).await?;
        self.mark_cleared(&message, ClearSide::Sender).await
    }

    /// Hide a message from the counterpart's view.
    pub async fn mark_receiver_cleared(&self, message_id: &Uuid) -> Result<(), ChatError> {
        let message = self.get_message(message_id).await?;
        self.mark_cleared(&message, ClearSide::Receiver).await
    }

    /// Clear a message from `user`'s side of the conversation.
    ///
    /// The side is derived from authorship: the author clears the sender
    /// flag, the counterpart clears the receiver flag.
    pub async fn clear_for(&self, message_id: &Uuid, user: &UserId) -> Result<ClearSide, ChatError> {
        let message = self.get_message(message_id).await?;
        let side = if &message.author_id == user {
            ClearSide::Sender
        } else {
            let session = self.get_session(&message.session_id).await?;
            if !session.has_participant(user) {
                return Err(ChatError::NotParticipant {
                    user: user.clone(),
                    session_id: session.id,
                });
            }
            ClearSide::Receiver
        };

        self.mark_cleared(&message, side).await?;
        Ok(side)
    }

    /// Apply a clear; only a flag that actually flips is announced.
    async fn mark_cleared(&self, message: &ChatMessage, side: ClearSide) -> Result<(), ChatError> {
        let changed = self
            .chat_repo
            .mark_cleared(&message.id, side)
            .await
            .map_err(|e| message_error(e, &message.id))?;

        if changed {
            debug!(message_id = %message.id, %side, "Message cleared");
            self.events.publish(ChatEvent::MessageCleared {
                message_id: message.id,
                session_id: message.session_id,
                side,
            });
        }
        Ok(())
    }

    /// All messages of a session, newest first, regardless of clear flags.
    ///
    /// The stream is lazy and reflects state at the time it is polled; call
    /// again for a fresh pass.
    pub async fn list_by_session(&self, session_id: &Uuid) -> Result<ChatMessageStream, ChatError> {
        let session = self.get_session(session_id).await?;
        let stream = self.chat_repo.stream_messages(&session.id, None);
        Ok(Box::pin(stream.map_err(ChatError::from)))
    }

    /// Messages of a session as `viewer` sees them (soft-cleared ones skipped).
    pub async fn list_visible_to(
        &self,
        session_id: &Uuid,
        viewer: &UserId,
    ) -> Result<ChatMessageStream, ChatError> {
        let session = self.get_session(session_id).await?;
        if !session.has_participant(viewer) {
            return Err(ChatError::NotParticipant {
                user: viewer.clone(),
                session_id: session.id,
            });
        }
        let stream = self.chat_repo.stream_messages(&session.id, Some(viewer));
        Ok(Box::pin(stream.map_err(ChatError::from)))
    }

    // --- Unread aggregation ---

    /// Total unread messages addressed to `user` across all their sessions.
    pub async fn count_unread_for_user(&self, user: &UserId) -> Result<u64, ChatError> {
        Ok(self.chat_repo.count_unread_for_user(user).await?)
    }

    /// Unread messages addressed to `user` in one session.
    pub async fn count_unread_in_session(
        &self,
        session_id: &Uuid,
        user: &UserId,
    ) -> Result<u64, ChatError> {
        let session = self.get_session(session_id).await?;
        Ok(self.chat_repo.count_unread_in_session(&session.id, user).await?)
    }
}

fn session_error(e: RepositoryError, session_id: &Uuid) -> ChatError {
    match e {
        RepositoryError::NotFound => ChatError::SessionNotFound(*session_id),
        other => other.into(),
    }
}

fn message_error(e: RepositoryError, message_id: &Uuid) -> ChatError {
    match e {
        RepositoryError::NotFound => ChatError::MessageNotFound(*message_id),
        other => other.into(),
    }
}
