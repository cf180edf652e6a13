//! Conversation CLI commands: send, sessions, unread.

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use uuid::Uuid;

use duochat_types::identity::UserId;

use super::truncate;
use crate::state::AppState;

/// Build a message payload from CLI text.
///
/// Plain text becomes `{"text": ...}`; with `raw` the text must be JSON.
pub fn payload_from_text(text: &str, raw: bool) -> Result<serde_json::Value> {
    if raw {
        serde_json::from_str(text).context("--raw payload is not valid JSON")
    } else {
        Ok(serde_json::json!({ "text": text }))
    }
}

/// Send a message from one user to another, creating the session on first contact.
///
/// # Examples
///
/// ```bash
/// duochat send --from alice --to bob "hi"
/// duochat send --from alice --to bob --raw '{"text":"hi","lang":"en"}'
/// ```
pub async fn send(
    state: &AppState,
    from: &UserId,
    to: &UserId,
    text: &str,
    raw: bool,
    json: bool,
) -> Result<()> {
    let payload = payload_from_text(text, raw)?;
    let message = state.chat_service.send(from, to, payload).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&message)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {} -> {}",
        style("✓").green().bold(),
        style(from).cyan(),
        style(to).cyan()
    );
    println!("  {}  {}", style("Session:").dim(), message.session_id);
    println!("  {}  {}", style("Message:").dim(), message.id);
    println!();

    Ok(())
}

/// List a user's conversations with counterpart, last activity, and unread count.
pub async fn list_sessions(state: &AppState, user: &UserId, json: bool) -> Result<()> {
    let sessions = state.chat_service.list_sessions_for_user(user).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        println!(
            "  {} No conversations for '{}'. Start one with: {}",
            style("i").blue().bold(),
            style(user).cyan(),
            style(format!("duochat send --from {user} --to <user> <text>")).yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("With").fg(Color::White),
        Cell::new("Last activity").fg(Color::White),
        Cell::new("Unread").fg(Color::White),
        Cell::new("Session").fg(Color::White),
    ]);

    for overview in &sessions {
        let unread_cell = if overview.unread > 0 {
            Cell::new(overview.unread).fg(Color::Yellow)
        } else {
            Cell::new("0").fg(Color::DarkGrey)
        };

        table.add_row(vec![
            Cell::new(truncate(overview.counterpart.as_str(), 24)).fg(Color::Cyan),
            Cell::new(overview.session.last_activity_at.format("%Y-%m-%d %H:%M").to_string()),
            unread_cell,
            Cell::new(overview.session.id.to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();

    Ok(())
}

/// Show unread counts for a user, overall or for one session.
pub async fn unread(state: &AppState, user: &UserId, session: Option<Uuid>, json: bool) -> Result<()> {
    let count = match session {
        Some(session_id) => {
            state
                .chat_service
                .count_unread_in_session(&session_id, user)
                .await?
        }
        None => state.chat_service.count_unread_for_user(user).await?,
    };

    if json {
        let out = serde_json::json!({
            "user_id": user,
            "session_id": session,
            "unread": count,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let styled = if count > 0 {
        style(count.to_string()).yellow().bold()
    } else {
        style(count.to_string()).dim()
    };
    println!("  {} unread for {}", styled, style(user).cyan());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_becomes_text_payload() {
        let payload = payload_from_text("hello", false).unwrap();
        assert_eq!(payload, serde_json::json!({ "text": "hello" }));
    }

    #[test]
    fn raw_payload_must_be_json() {
        let payload = payload_from_text(r#"{"sticker": 7}"#, true).unwrap();
        assert_eq!(payload["sticker"], 7);
        assert!(payload_from_text("not json", true).is_err());
    }
}
