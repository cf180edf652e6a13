//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `duochat-core` using sqlx with split read/write pools.
//! Raw queries, private Row structs for mapping, writes on the single-connection
//! writer pool, reads on the reader pool.

use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use sqlx::Row;
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use duochat_core::chat::repository::{ChatRepository, MessageStream};
use duochat_types::chat::{
    ChatMessage, ChatSession, ClearSide, ParticipantPair, SessionOutcome, SessionOverview,
};
use duochat_types::error::RepositoryError;
use duochat_types::identity::UserId;

use super::datetime::{format_datetime, parse_datetime};
use super::pool::DatabasePool;

/// SQLite-backed implementation of `ChatRepository`.
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type for mapping SQLite rows to domain ChatSession.
struct ChatSessionRow {
    id: String,
    participant_a: String,
    participant_b: String,
    created_at: String,
    last_activity_at: String,
}

impl ChatSessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            participant_a: row.try_get("participant_a")?,
            participant_b: row.try_get("participant_b")?,
            created_at: row.try_get("created_at")?,
            last_activity_at: row.try_get("last_activity_at")?,
        })
    }

    fn into_session(self) -> Result<ChatSession, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid session id: {e}")))?;

        Ok(ChatSession {
            id,
            participant_a: parse_user(self.participant_a)?,
            participant_b: parse_user(self.participant_b)?,
            created_at: parse_datetime(&self.created_at)?,
            last_activity_at: parse_datetime(&self.last_activity_at)?,
        })
    }
}

/// Internal row type for mapping SQLite rows to domain ChatMessage.
struct ChatMessageRow {
    id: String,
    session_id: String,
    author_id: String,
    created_at: String,
    payload: String,
    is_read: i64,
    sender_cleared: i64,
    receiver_cleared: i64,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            author_id: row.try_get("author_id")?,
            created_at: row.try_get("created_at")?,
            payload: row.try_get("payload")?,
            is_read: row.try_get("is_read")?,
            sender_cleared: row.try_get("sender_cleared")?,
            receiver_cleared: row.try_get("receiver_cleared")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let session_id = Uuid::parse_str(&self.session_id)
            .map_err(|e| RepositoryError::Query(format!("invalid session_id: {e}")))?;
        let payload = serde_json::from_str(&self.payload)
            .map_err(|e| RepositoryError::Query(format!("invalid payload: {e}")))?;

        Ok(ChatMessage {
            id,
            session_id,
            author_id: parse_user(self.author_id)?,
            created_at: parse_datetime(&self.created_at)?,
            payload,
            read: self.is_read != 0,
            sender_cleared: self.sender_cleared != 0,
            receiver_cleared: self.receiver_cleared != 0,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_user(raw: String) -> Result<UserId, RepositoryError> {
    UserId::new(raw).map_err(|e| RepositoryError::Query(e.to_string()))
}

fn query_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

fn session_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ChatSession, RepositoryError> {
    ChatSessionRow::from_row(row)
        .map_err(query_error)?
        .into_session()
}

fn message_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ChatMessage, RepositoryError> {
    ChatMessageRow::from_row(row)
        .map_err(query_error)?
        .into_message()
}

async fn select_session_by_pair(
    pool: &SqlitePool,
    pair: &ParticipantPair,
) -> Result<Option<ChatSession>, RepositoryError> {
    let row = sqlx::query("SELECT * FROM chat_sessions WHERE pair_low = ? AND pair_high = ?")
        .bind(pair.low().as_str())
        .bind(pair.high().as_str())
        .fetch_optional(pool)
        .await
        .map_err(query_error)?;

    row.as_ref().map(session_from_row).transpose()
}

const SELECT_TIMELINE: &str = r#"SELECT * FROM chat_messages
    WHERE session_id = ?
    ORDER BY created_at DESC, id DESC"#;

const SELECT_VISIBLE_TIMELINE: &str = r#"SELECT * FROM chat_messages
    WHERE session_id = ?
      AND NOT ((author_id = ? AND sender_cleared = 1) OR (author_id <> ? AND receiver_cleared = 1))
    ORDER BY created_at DESC, id DESC"#;

const TOUCH_SESSION: &str =
    "UPDATE chat_sessions SET last_activity_at = MAX(last_activity_at, ?) WHERE id = ?";

// ---------------------------------------------------------------------------
// ChatRepository implementation
// ---------------------------------------------------------------------------

impl ChatRepository for SqliteChatRepository {
    async fn create_session_if_absent(
        &self,
        session: &ChatSession,
    ) -> Result<SessionOutcome, RepositoryError> {
        let pair = session.pair();

        // The (pair_low, pair_high) unique index decides the race; the loser
        // inserts nothing and reads back the winner's row.
        let result = sqlx::query(
            r#"INSERT INTO chat_sessions (id, participant_a, participant_b, pair_low, pair_high, created_at, last_activity_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT (pair_low, pair_high) DO NOTHING"#,
        )
        .bind(session.id.to_string())
        .bind(session.participant_a.as_str())
        .bind(session.participant_b.as_str())
        .bind(pair.low().as_str())
        .bind(pair.high().as_str())
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.last_activity_at))
        .execute(&self.pool.writer)
        .await;

        let inserted = match result {
            Ok(done) => done.rows_affected() == 1,
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => {
                return Err(RepositoryError::Conflict(format!(
                    "session id '{}' already exists",
                    session.id
                )));
            }
            Err(e) => return Err(query_error(e)),
        };

        if inserted {
            return Ok(SessionOutcome::Created(session.clone()));
        }

        let existing = select_session_by_pair(&self.pool.writer, &pair)
            .await?
            .ok_or_else(|| {
                RepositoryError::Conflict(format!(
                    "session for {} and {} vanished after conflict",
                    pair.low(),
                    pair.high()
                ))
            })?;
        Ok(SessionOutcome::Existing(existing))
    }

    async fn find_session(
        &self,
        pair: &ParticipantPair,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        select_session_by_pair(&self.pool.reader, pair).await
    }

    async fn get_session(&self, session_id: &Uuid) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_sessions WHERE id = ?")
            .bind(session_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn touch_session(
        &self,
        session_id: &Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(TOUCH_SESSION)
            .bind(format_datetime(&at))
            .bind(session_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn list_sessions_for_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<SessionOverview>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT s.*,
                      (SELECT COUNT(*) FROM chat_messages m
                        WHERE m.session_id = s.id AND m.is_read = 0 AND m.author_id <> ?) AS unread
               FROM chat_sessions s
               WHERE s.participant_a = ? OR s.participant_b = ?
               ORDER BY s.last_activity_at DESC, s.id DESC"#,
        )
        .bind(user.as_str())
        .bind(user.as_str())
        .bind(user.as_str())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let mut overviews = Vec::with_capacity(rows.len());
        for row in &rows {
            let session = session_from_row(row)?;
            let unread: i64 = row.try_get("unread").map_err(query_error)?;
            let counterpart = session.counterpart(user).cloned().ok_or_else(|| {
                RepositoryError::Query(format!("{user} missing from session {}", session.id))
            })?;
            overviews.push(SessionOverview {
                session,
                counterpart,
                unread: unread as u64,
            });
        }

        Ok(overviews)
    }

    async fn append_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        let payload = serde_json::to_string(&message.payload)
            .map_err(|e| RepositoryError::Query(format!("invalid payload: {e}")))?;

        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        // Touch first: a missing session aborts before the insert trips the FK.
        let touched = sqlx::query(TOUCH_SESSION)
            .bind(format_datetime(&message.created_at))
            .bind(message.session_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        if touched.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            r#"INSERT INTO chat_messages (id, session_id, author_id, created_at, payload, is_read, sender_cleared, receiver_cleared)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(message.id.to_string())
        .bind(message.session_id.to_string())
        .bind(message.author_id.as_str())
        .bind(format_datetime(&message.created_at))
        .bind(payload)
        .bind(message.read)
        .bind(message.sender_cleared)
        .bind(message.receiver_cleared)
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;

        Ok(())
    }

    async fn get_message(&self, message_id: &Uuid) -> Result<Option<ChatMessage>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_messages WHERE id = ?")
            .bind(message_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        row.as_ref().map(message_from_row).transpose()
    }

    async fn mark_read(&self, message_id: &Uuid) -> Result<(), RepositoryError> {
        // SQLite counts matched rows, so an already-read message still reports 1.
        let result = sqlx::query("UPDATE chat_messages SET is_read = 1 WHERE id = ?")
            .bind(message_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn mark_all_read(
        &self,
        session_id: &Uuid,
        excluding_author: &UserId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE chat_messages SET is_read = 1 WHERE session_id = ? AND is_read = 0 AND author_id <> ?",
        )
        .bind(session_id.to_string())
        .bind(excluding_author.as_str())
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(result.rows_affected())
    }

    async fn mark_cleared(&self, message_id: &Uuid, side: ClearSide) -> Result<bool, RepositoryError> {
        let sql = match side {
            ClearSide::Sender => {
                "UPDATE chat_messages SET sender_cleared = 1 WHERE id = ? AND sender_cleared = 0"
            }
            ClearSide::Receiver => {
                "UPDATE chat_messages SET receiver_cleared = 1 WHERE id = ? AND receiver_cleared = 0"
            }
        };

        let result = sqlx::query(sql)
            .bind(message_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        // Nothing flipped: either already cleared or no such message.
        let exists = sqlx::query("SELECT 1 FROM chat_messages WHERE id = ?")
            .bind(message_id.to_string())
            .fetch_optional(&self.pool.writer)
            .await
            .map_err(query_error)?;

        match exists {
            Some(_) => Ok(false),
            None => Err(RepositoryError::NotFound),
        }
    }

    fn stream_messages(&self, session_id: &Uuid, viewer: Option<&UserId>) -> MessageStream {
        let reader = self.pool.reader.clone();
        let session_id = session_id.to_string();
        let viewer = viewer.map(|v| v.as_str().to_owned());

        Box::pin(async_stream::try_stream! {
            let mut rows = match viewer.as_deref() {
                None => sqlx::query(SELECT_TIMELINE)
                    .bind(session_id.as_str())
                    .fetch(&reader),
                Some(viewer) => sqlx::query(SELECT_VISIBLE_TIMELINE)
                    .bind(session_id.as_str())
                    .bind(viewer)
                    .bind(viewer)
                    .fetch(&reader),
            };

            while let Some(row) = rows.try_next().await.map_err(query_error)? {
                let message = message_from_row(&row)?;
                yield message;
            }
        })
    }

    async fn count_unread_for_user(&self, user: &UserId) -> Result<u64, RepositoryError> {
        let row = sqlx::query(
            r#"SELECT COUNT(*) AS cnt
               FROM chat_messages m
               JOIN chat_sessions s ON s.id = m.session_id
               WHERE (s.participant_a = ? OR s.participant_b = ?)
                 AND m.is_read = 0
                 AND m.author_id <> ?"#,
        )
        .bind(user.as_str())
        .bind(user.as_str())
        .bind(user.as_str())
        .fetch_one(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let count: i64 = row.try_get("cnt").map_err(query_error)?;
        Ok(count as u64)
    }

    async fn count_unread_in_session(
        &self,
        session_id: &Uuid,
        user: &UserId,
    ) -> Result<u64, RepositoryError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS cnt FROM chat_messages WHERE session_id = ? AND is_read = 0 AND author_id <> ?",
        )
        .bind(session_id.to_string())
        .bind(user.as_str())
        .fetch_one(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let count: i64 = row.try_get("cnt").map_err(query_error)?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use duochat_types::chat::timestamp_now;
    use serde_json::json;

    use crate::sqlite::pool::{DatabasePool, database_url};

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let url = database_url(dir.path());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn user(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    async fn create_session(repo: &SqliteChatRepository, a: &str, b: &str) -> ChatSession {
        repo.create_session_if_absent(&ChatSession::new(user(a), user(b)))
            .await
            .unwrap()
            .into_session()
    }

    async fn append(repo: &SqliteChatRepository, session: &ChatSession, author: &str, text: &str) -> ChatMessage {
        let message = ChatMessage::new(session.id, user(author), json!({ "text": text }));
        repo.append_message(&message).await.unwrap();
        message
    }

    async fn collect(stream: MessageStream) -> Vec<ChatMessage> {
        stream.try_collect().await.unwrap()
    }

    async fn message_rows(pool: &DatabasePool) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chat_messages")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        count
    }

    #[tokio::test]
    async fn test_create_if_absent_dedups_either_order() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());

        let first = repo
            .create_session_if_absent(&ChatSession::new(user("alice"), user("bob")))
            .await
            .unwrap();
        assert!(first.was_created());

        let second = repo
            .create_session_if_absent(&ChatSession::new(user("bob"), user("alice")))
            .await
            .unwrap();
        assert!(!second.was_created());
        assert_eq!(second.session().id, first.session().id);
        assert_eq!(second.session().participant_a.as_str(), "alice");

        let found = repo
            .find_session(&ParticipantPair::new(&user("bob"), &user("alice")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, first.session().id);

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chat_sessions")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_concurrent_create_if_absent_yields_one_row() {
        let pool = test_pool().await;
        let repo = Arc::new(SqliteChatRepository::new(pool.clone()));

        let mut handles = Vec::new();
        for i in 0..10 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                let session = if i % 2 == 0 {
                    ChatSession::new(user("alice"), user("bob"))
                } else {
                    ChatSession::new(user("bob"), user("alice"))
                };
                repo.create_session_if_absent(&session).await.unwrap()
            }));
        }

        let mut created = 0;
        let mut ids = Vec::new();
        for handle in handles {
            let outcome = handle.await.unwrap();
            if outcome.was_created() {
                created += 1;
            }
            ids.push(outcome.session().id);
        }

        assert_eq!(created, 1);
        ids.dedup();
        assert_eq!(ids.len(), 1);

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chat_sessions")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_get_session_roundtrip_and_missing() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);

        let session = create_session(&repo, "alice", "bob").await;
        let fetched = repo.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(fetched, session);

        assert!(repo.get_session(&Uuid::now_v7()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_touch_never_moves_backwards() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);
        let session = create_session(&repo, "alice", "bob").await;

        let later = session.last_activity_at + chrono::Duration::seconds(10);
        repo.touch_session(&session.id, later).await.unwrap();
        repo.touch_session(&session.id, session.last_activity_at).await.unwrap();

        let fetched = repo.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(fetched.last_activity_at, later);

        let err = repo
            .touch_session(&Uuid::now_v7(), timestamp_now())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_append_persists_and_touches() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);
        let session = create_session(&repo, "alice", "bob").await;

        tokio::time::sleep(Duration::from_millis(2)).await;
        let message = append(&repo, &session, "alice", "hi").await;

        let stored = repo.get_message(&message.id).await.unwrap().unwrap();
        assert_eq!(stored, message);
        assert_eq!(stored.payload["text"], "hi");

        let touched = repo.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(touched.last_activity_at, message.created_at);
    }

    #[tokio::test]
    async fn test_append_to_missing_session_writes_nothing() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());

        let orphan = ChatMessage::new(Uuid::now_v7(), user("alice"), json!("lost"));
        let err = repo.append_message(&orphan).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
        assert_eq!(message_rows(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_appends_keep_touch_consistent() {
        let pool = test_pool().await;
        let repo = Arc::new(SqliteChatRepository::new(pool.clone()));
        let session = create_session(&repo, "alice", "bob").await;

        let mut handles = Vec::new();
        for i in 0..16 {
            let repo = Arc::clone(&repo);
            let session_id = session.id;
            handles.push(tokio::spawn(async move {
                let message = ChatMessage::new(session_id, user("alice"), json!({ "seq": i }));
                repo.append_message(&message).await.unwrap();
                message.created_at
            }));
        }

        let mut latest = session.last_activity_at;
        for handle in handles {
            latest = latest.max(handle.await.unwrap());
        }

        assert_eq!(message_rows(&pool).await, 16);

        let touched = repo.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(touched.last_activity_at, latest);

        assert_eq!(repo.count_unread_for_user(&user("bob")).await.unwrap(), 16);
        assert_eq!(repo.count_unread_for_user(&user("alice")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_read_idempotent() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);
        let session = create_session(&repo, "alice", "bob").await;
        let message = append(&repo, &session, "alice", "hi").await;

        repo.mark_read(&message.id).await.unwrap();
        repo.mark_read(&message.id).await.unwrap();
        assert!(repo.get_message(&message.id).await.unwrap().unwrap().read);

        let err = repo.mark_read(&Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_mark_all_read_excludes_author() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);
        let session = create_session(&repo, "alice", "bob").await;

        let from_alice = append(&repo, &session, "alice", "one").await;
        append(&repo, &session, "bob", "two").await;
        append(&repo, &session, "bob", "three").await;

        let updated = repo.mark_all_read(&session.id, &user("alice")).await.unwrap();
        assert_eq!(updated, 2);
        assert!(!repo.get_message(&from_alice.id).await.unwrap().unwrap().read);

        assert_eq!(repo.mark_all_read(&session.id, &user("alice")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_cleared_sets_one_flag() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);
        let session = create_session(&repo, "alice", "bob").await;
        let message = append(&repo, &session, "alice", "oops").await;

        assert!(repo.mark_cleared(&message.id, ClearSide::Sender).await.unwrap());
        assert!(!repo.mark_cleared(&message.id, ClearSide::Sender).await.unwrap());

        let stored = repo.get_message(&message.id).await.unwrap().unwrap();
        assert!(stored.sender_cleared);
        assert!(!stored.receiver_cleared);

        let err = repo
            .mark_cleared(&Uuid::now_v7(), ClearSide::Receiver)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_stream_orders_newest_first() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);
        let session = create_session(&repo, "alice", "bob").await;

        let mut sent = Vec::new();
        for text in ["t1", "t2", "t3"] {
            sent.push(append(&repo, &session, "alice", text).await.id);
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let listed: Vec<Uuid> = collect(repo.stream_messages(&session.id, None))
            .await
            .into_iter()
            .map(|m| m.id)
            .collect();
        sent.reverse();
        assert_eq!(listed, sent);
    }

    #[tokio::test]
    async fn test_stream_breaks_timestamp_ties_by_id() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);
        let session = create_session(&repo, "alice", "bob").await;

        let at = timestamp_now();
        let mut first = ChatMessage::new(session.id, user("alice"), json!("a"));
        let mut second = ChatMessage::new(session.id, user("bob"), json!("b"));
        first.created_at = at;
        second.created_at = at;

        repo.append_message(&first).await.unwrap();
        repo.append_message(&second).await.unwrap();

        let (low, high) = if first.id < second.id {
            (first.id, second.id)
        } else {
            (second.id, first.id)
        };
        let listed = collect(repo.stream_messages(&session.id, None)).await;
        assert_eq!(listed[0].id, high);
        assert_eq!(listed[1].id, low);
    }

    #[tokio::test]
    async fn test_stream_filters_cleared_for_viewer() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);
        let session = create_session(&repo, "alice", "bob").await;

        let hidden_for_alice = append(&repo, &session, "alice", "mine").await;
        let hidden_for_bob = append(&repo, &session, "alice", "also mine").await;
        append(&repo, &session, "bob", "theirs").await;

        repo.mark_cleared(&hidden_for_alice.id, ClearSide::Sender).await.unwrap();
        repo.mark_cleared(&hidden_for_bob.id, ClearSide::Receiver).await.unwrap();

        let alice_view = collect(repo.stream_messages(&session.id, Some(&user("alice")))).await;
        assert_eq!(alice_view.len(), 2);
        assert!(alice_view.iter().all(|m| m.id != hidden_for_alice.id));

        let bob_view = collect(repo.stream_messages(&session.id, Some(&user("bob")))).await;
        assert_eq!(bob_view.len(), 2);
        assert!(bob_view.iter().all(|m| m.id != hidden_for_bob.id));

        assert_eq!(collect(repo.stream_messages(&session.id, None)).await.len(), 3);
    }

    #[tokio::test]
    async fn test_stream_of_empty_session() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);
        let session = create_session(&repo, "alice", "bob").await;

        assert!(collect(repo.stream_messages(&session.id, None)).await.is_empty());
    }

    #[tokio::test]
    async fn test_unread_counts_across_sessions() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);
        let with_bob = create_session(&repo, "alice", "bob").await;
        let with_carol = create_session(&repo, "carol", "alice").await;
        let unrelated = create_session(&repo, "bob", "carol").await;

        append(&repo, &with_bob, "bob", "1").await;
        append(&repo, &with_carol, "carol", "2").await;
        let read = append(&repo, &with_carol, "carol", "3").await;
        append(&repo, &with_carol, "alice", "own").await;
        append(&repo, &unrelated, "bob", "not for alice").await;

        repo.mark_read(&read.id).await.unwrap();

        let alice = user("alice");
        assert_eq!(repo.count_unread_for_user(&alice).await.unwrap(), 2);
        assert_eq!(repo.count_unread_in_session(&with_carol.id, &alice).await.unwrap(), 1);
        assert_eq!(repo.count_unread_for_user(&user("dave")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_sessions_for_user() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);
        let with_bob = create_session(&repo, "alice", "bob").await;
        let with_carol = create_session(&repo, "carol", "alice").await;
        create_session(&repo, "bob", "carol").await;

        tokio::time::sleep(Duration::from_millis(2)).await;
        append(&repo, &with_bob, "bob", "latest").await;

        let list = repo.list_sessions_for_user(&user("alice")).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].session.id, with_bob.id);
        assert_eq!(list[0].counterpart.as_str(), "bob");
        assert_eq!(list[0].unread, 1);
        assert_eq!(list[1].session.id, with_carol.id);
        assert_eq!(list[1].counterpart.as_str(), "carol");
        assert_eq!(list[1].unread, 0);
    }
}
