//! Presence CLI command.

use anyhow::Result;
use console::style;

use duochat_core::presence::PresenceRepository;
use duochat_types::identity::UserId;

use crate::state::AppState;

/// Show a user's online flag, updating it first when `set` is given.
pub async fn presence(state: &AppState, user: &UserId, set: Option<bool>, json: bool) -> Result<()> {
    let presence = match set {
        Some(online) => state.presence_repo.set_online(user, online).await?,
        None => state.presence_repo.get_presence(user).await?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&presence)?);
        return Ok(());
    }

    let status = if presence.is_online {
        style("online").green().bold()
    } else {
        style("offline").dim()
    };
    let since = presence
        .updated_at
        .map(|t| format!(" (since {})", t.format("%Y-%m-%d %H:%M")))
        .unwrap_or_default();
    println!("  {} is {}{}", style(user).cyan(), status, since);

    Ok(())
}
