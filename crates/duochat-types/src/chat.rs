//! Session and message types for direct (1:1) conversations.
//!
//! A `ChatSession` pairs exactly two user identities; a `ChatMessage` is one
//! chat event inside a session with its read and soft-clear flags.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::identity::UserId;

/// Current time truncated to microseconds, the precision stored by the database.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Order-independent key for a pair of identities.
///
/// `{u, v}` and `{v, u}` normalize to the same `(low, high)` tuple, which is
/// what the session registry indexes and deduplicates on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParticipantPair {
    low: UserId,
    high: UserId,
}

impl ParticipantPair {
    pub fn new(u: &UserId, v: &UserId) -> Self {
        if u <= v {
            Self {
                low: u.clone(),
                high: v.clone(),
            }
        } else {
            Self {
                low: v.clone(),
                high: u.clone(),
            }
        }
    }

    pub fn low(&self) -> &UserId {
        &self.low
    }

    pub fn high(&self) -> &UserId {
        &self.high
    }

    /// True when both sides are the same identity.
    pub fn is_degenerate(&self) -> bool {
        self.low == self.high
    }
}

/// A conversation between exactly two distinct identities.
///
/// `participant_a` is the identity that initiated the session; the pair is
/// otherwise unordered. `last_activity_at` never moves backwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub participant_a: UserId,
    pub participant_b: UserId,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl ChatSession {
    /// Build a fresh session between `initiator` and `other`, stamped with the current time.
    pub fn new(initiator: UserId, other: UserId) -> Self {
        let now = timestamp_now();
        Self {
            id: Uuid::now_v7(),
            participant_a: initiator,
            participant_b: other,
            created_at: now,
            last_activity_at: now,
        }
    }

    pub fn pair(&self) -> ParticipantPair {
        ParticipantPair::new(&self.participant_a, &self.participant_b)
    }

    pub fn has_participant(&self, user: &UserId) -> bool {
        &self.participant_a == user || &self.participant_b == user
    }

    /// The other side of the conversation, or `None` if `user` is not a participant.
    pub fn counterpart(&self, user: &UserId) -> Option<&UserId> {
        if &self.participant_a == user {
            Some(&self.participant_b)
        } else if &self.participant_b == user {
            Some(&self.participant_a)
        } else {
            None
        }
    }

    /// Channel key under which live connections for this conversation are grouped.
    pub fn room_name(&self) -> String {
        format!("chat_{}", self.id)
    }
}

/// Result of `create_if_absent`: the session plus whether this call created it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "session", rename_all = "snake_case")]
pub enum SessionOutcome {
    Created(ChatSession),
    Existing(ChatSession),
}

impl SessionOutcome {
    pub fn session(&self) -> &ChatSession {
        match self {
            SessionOutcome::Created(s) | SessionOutcome::Existing(s) => s,
        }
    }

    pub fn into_session(self) -> ChatSession {
        match self {
            SessionOutcome::Created(s) | SessionOutcome::Existing(s) => s,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, SessionOutcome::Created(_))
    }
}

/// One entry of a user's conversation list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOverview {
    pub session: ChatSession,
    /// The participant on the other side from the listing user.
    pub counterpart: UserId,
    /// Unread messages from the counterpart in this session.
    pub unread: u64,
}

/// A single chat event within a session.
///
/// `id`, `session_id`, `author_id`, `created_at` and `payload` are fixed at
/// creation. `read`, `sender_cleared` and `receiver_cleared` only ever flip
/// from false to true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
    /// Opaque application content.
    pub payload: serde_json::Value,
    pub read: bool,
    /// Hidden from the author's view.
    pub sender_cleared: bool,
    /// Hidden from the counterpart's view.
    pub receiver_cleared: bool,
}

impl ChatMessage {
    /// Build an unread, uncleared message authored by `author_id`.
    pub fn new(session_id: Uuid, author_id: UserId, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::now_v7(),
            session_id,
            author_id,
            created_at: timestamp_now(),
            payload,
            read: false,
            sender_cleared: false,
            receiver_cleared: false,
        }
    }

    /// Whether `viewer` still sees this message after soft-clears.
    pub fn is_visible_to(&self, viewer: &UserId) -> bool {
        if &self.author_id == viewer {
            !self.sender_cleared
        } else {
            !self.receiver_cleared
        }
    }
}

/// Which side of a conversation a soft-clear applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClearSide {
    Sender,
    Receiver,
}

impl fmt::Display for ClearSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClearSide::Sender => write!(f, "sender"),
            ClearSide::Receiver => write!(f, "receiver"),
        }
    }
}

impl FromStr for ClearSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sender" => Ok(ClearSide::Sender),
            "receiver" => Ok(ClearSide::Receiver),
            other => Err(format!("invalid clear side: '{other}'")),
        }
    }
}
