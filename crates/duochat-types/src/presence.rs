use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::UserId;

/// Online flag for a user, maintained by the connection lifecycle layer.
///
/// The chat engine stores and returns it but never derives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPresence {
    pub user_id: UserId,
    pub is_online: bool,
    /// When the flag was last written; `None` for users never seen.
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserPresence {
    /// Presence for a user with no recorded state.
    pub fn offline(user_id: UserId) -> Self {
        Self {
            user_id,
            is_online: false,
            updated_at: None,
        }
    }
}
