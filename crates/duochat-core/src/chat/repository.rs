//! ChatRepository trait definition.
//!
//! Storage port for sessions, messages, and unread queries. Uses native
//! async fn in traits (RPITIT, Rust 2024 edition) for point operations and a
//! boxed stream for message listing.

use std::pin::Pin;

use chrono::{DateTime, Utc};
use futures_util::Stream;
use uuid::Uuid;

use duochat_types::chat::{ChatMessage, ChatSession, ClearSide, ParticipantPair, SessionOverview, SessionOutcome};
use duochat_types::error::RepositoryError;
use duochat_types::identity::UserId;

/// Lazy sequence of messages, newest first.
pub type MessageStream =
    Pin<Box<dyn Stream<Item = Result<ChatMessage, RepositoryError>> + Send + 'static>>;

/// Repository trait for session and message persistence.
///
/// Implementations live in duochat-infra (e.g., `SqliteChatRepository`).
/// Implementations must uphold the atomicity contracts documented on
/// `create_session_if_absent` and `append_message`.
pub trait ChatRepository: Send + Sync {
    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    /// Insert `session` unless a session for the same unordered pair exists.
    ///
    /// Must be atomic: concurrent calls for one pair produce exactly one row.
    /// Returns `Existing` with the stored session when the pair was taken.
    fn create_session_if_absent(
        &self,
        session: &ChatSession,
    ) -> impl std::future::Future<Output = Result<SessionOutcome, RepositoryError>> + Send;

    /// Look up the session for an unordered pair.
    fn find_session(
        &self,
        pair: &ParticipantPair,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// Get a session by its unique ID.
    fn get_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// Move `last_activity_at` forward to `at` (never backwards).
    ///
    /// Returns `NotFound` if the session does not exist.
    fn touch_session(
        &self,
        session_id: &Uuid,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Sessions `user` participates in, most recently active first.
    fn list_sessions_for_user(
        &self,
        user: &UserId,
    ) -> impl std::future::Future<Output = Result<Vec<SessionOverview>, RepositoryError>> + Send;

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    /// Persist `message` and touch its session to `message.created_at`.
    ///
    /// Both writes form one unit: readers see both or neither. Returns
    /// `NotFound` if the owning session does not exist.
    fn append_message(
        &self,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a message by its unique ID.
    fn get_message(
        &self,
        message_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatMessage>, RepositoryError>> + Send;

    /// Set `read = true`. Idempotent; `NotFound` if the message does not exist.
    fn mark_read(
        &self,
        message_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Mark every unread message in the session not authored by `excluding_author`.
    ///
    /// Returns the number of messages that changed.
    fn mark_all_read(
        &self,
        session_id: &Uuid,
        excluding_author: &UserId,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Set the clear flag for `side`.
    ///
    /// Returns whether the flag changed; `false` when it was already set.
    /// `NotFound` if the message does not exist.
    fn mark_cleared(
        &self,
        message_id: &Uuid,
        side: ClearSide,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Stream the session's messages ordered by `created_at DESC, id DESC`.
    ///
    /// With `viewer` set, messages soft-cleared from that viewer's side are
    /// skipped. Each call reads current state; streams are not shared.
    fn stream_messages(&self, session_id: &Uuid, viewer: Option<&UserId>) -> MessageStream;

    // -----------------------------------------------------------------------
    // Unread counts
    // -----------------------------------------------------------------------

    /// Unread messages not authored by `user`, across all of `user`'s sessions.
    fn count_unread_for_user(
        &self,
        user: &UserId,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Unread messages not authored by `user` in one session.
    fn count_unread_in_session(
        &self,
        session_id: &Uuid,
        user: &UserId,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
