//! Message CLI commands: messages, read, read-all, clear.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use futures_util::{StreamExt, TryStreamExt};
use uuid::Uuid;

use duochat_types::chat::ChatMessage;
use duochat_types::identity::UserId;

use super::truncate;
use crate::state::AppState;

/// One-line preview of a payload: its `text` field if present, else compact JSON.
fn payload_preview(payload: &serde_json::Value) -> String {
    match payload.get("text").and_then(|t| t.as_str()) {
        Some(text) => text.to_string(),
        None => match payload.as_str() {
            Some(s) => s.to_string(),
            None => payload.to_string(),
        },
    }
}

/// Show a session's messages, newest first.
///
/// With `viewer`, messages that participant cleared (or that were cleared on
/// their side) are hidden.
pub async fn list_messages(
    state: &AppState,
    session_id: &Uuid,
    viewer: Option<&UserId>,
    limit: usize,
    json: bool,
) -> Result<()> {
    let stream = match viewer {
        Some(viewer) => state.chat_service.list_visible_to(session_id, viewer).await?,
        None => state.chat_service.list_by_session(session_id).await?,
    };
    let messages: Vec<ChatMessage> = stream.take(limit).try_collect().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!();
        println!("  {} No messages in this session yet.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Sent").fg(Color::White),
        Cell::new("From").fg(Color::White),
        Cell::new("Message").fg(Color::White),
        Cell::new("Read").fg(Color::White),
        Cell::new("Cleared").fg(Color::White),
    ]);

    for message in &messages {
        let read_cell = if message.read {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no").fg(Color::Yellow)
        };

        let cleared = match (message.sender_cleared, message.receiver_cleared) {
            (true, true) => "both",
            (true, false) => "sender",
            (false, true) => "receiver",
            (false, false) => "",
        };

        table.add_row(vec![
            Cell::new(message.created_at.format("%Y-%m-%d %H:%M:%S").to_string()),
            Cell::new(message.author_id.as_str()).fg(Color::Cyan),
            Cell::new(truncate(&payload_preview(&message.payload), 60)),
            read_cell,
            Cell::new(cleared).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();

    Ok(())
}

/// Mark one message read.
pub async fn mark_read(state: &AppState, message_id: &Uuid, json: bool) -> Result<()> {
    state.chat_service.mark_read(message_id).await?;

    if json {
        println!("{}", serde_json::json!({ "message_id": message_id, "read": true }));
    } else {
        println!("  {} Message {} marked read", style("✓").green().bold(), message_id);
    }

    Ok(())
}

/// Mark every message in the session not written by `reader` as read.
pub async fn mark_all_read(state: &AppState, session_id: &Uuid, reader: &UserId, json: bool) -> Result<()> {
    let updated = state
        .chat_service
        .mark_all_read_in_session(session_id, reader)
        .await?;

    if json {
        println!("{}", serde_json::json!({ "session_id": session_id, "updated": updated }));
    } else {
        println!(
            "  {} {} message(s) marked read for {}",
            style("✓").green().bold(),
            updated,
            style(reader).cyan()
        );
    }

    Ok(())
}

/// Clear a message from `user`'s side of the conversation.
pub async fn clear(state: &AppState, message_id: &Uuid, user: &UserId, json: bool) -> Result<()> {
    let side = state.chat_service.clear_for(message_id, user).await?;

    if json {
        println!("{}", serde_json::json!({ "message_id": message_id, "cleared": side }));
    } else {
        println!(
            "  {} Message {} cleared on the {} side",
            style("✓").green().bold(),
            message_id,
            side
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn preview_prefers_text_field() {
        assert_eq!(payload_preview(&json!({ "text": "hi", "x": 1 })), "hi");
        assert_eq!(payload_preview(&json!("bare")), "bare");
        assert_eq!(payload_preview(&json!({ "sticker": 7 })), r#"{"sticker":7}"#);
    }
}
