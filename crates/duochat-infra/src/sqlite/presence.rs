//! SQLite presence repository implementation.

use sqlx::Row;

use duochat_core::presence::PresenceRepository;
use duochat_types::chat::timestamp_now;
use duochat_types::error::RepositoryError;
use duochat_types::identity::UserId;
use duochat_types::presence::UserPresence;

use super::datetime::{format_datetime, parse_datetime};
use super::pool::DatabasePool;

/// SQLite-backed implementation of `PresenceRepository`.
pub struct SqlitePresenceRepository {
    pool: DatabasePool,
}

impl SqlitePresenceRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl PresenceRepository for SqlitePresenceRepository {
    async fn set_online(&self, user: &UserId, online: bool) -> Result<UserPresence, RepositoryError> {
        let now = timestamp_now();

        sqlx::query(
            r#"INSERT INTO user_presence (user_id, is_online, updated_at)
               VALUES (?, ?, ?)
               ON CONFLICT (user_id) DO UPDATE SET is_online = excluded.is_online, updated_at = excluded.updated_at"#,
        )
        .bind(user.as_str())
        .bind(online)
        .bind(format_datetime(&now))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tracing::debug!(user = %user, online, "Presence updated");

        Ok(UserPresence {
            user_id: user.clone(),
            is_online: online,
            updated_at: Some(now),
        })
    }

    async fn get_presence(&self, user: &UserId) -> Result<UserPresence, RepositoryError> {
        let row = sqlx::query("SELECT is_online, updated_at FROM user_presence WHERE user_id = ?")
            .bind(user.as_str())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let Some(row) = row else {
            return Ok(UserPresence::offline(user.clone()));
        };

        let is_online: i64 = row
            .try_get("is_online")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        let updated_at: String = row
            .try_get("updated_at")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(UserPresence {
            user_id: user.clone(),
            is_online: is_online != 0,
            updated_at: Some(parse_datetime(&updated_at)?),
        })
    }
}
