//! Presence port.
//!
//! The online flag is written and read by the connection lifecycle layer.
//! The chat engine only provides storage for it.

use duochat_types::error::RepositoryError;
use duochat_types::identity::UserId;
use duochat_types::presence::UserPresence;

/// Repository trait for the per-user online flag.
pub trait PresenceRepository: Send + Sync {
    /// Record whether `user` currently has a live connection.
    fn set_online(
        &self,
        user: &UserId,
        online: bool,
    ) -> impl std::future::Future<Output = Result<UserPresence, RepositoryError>> + Send;

    /// Current presence for `user`; users never recorded are offline.
    fn get_presence(
        &self,
        user: &UserId,
    ) -> impl std::future::Future<Output = Result<UserPresence, RepositoryError>> + Send;
}
