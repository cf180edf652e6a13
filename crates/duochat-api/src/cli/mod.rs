//! CLI command definitions for the `duochat` binary.
//!
//! Uses clap derive macros for argument parsing. Every command acts on the
//! local database directly; `serve` exposes the same operations over HTTP.

pub mod message;
pub mod presence;
pub mod session;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use uuid::Uuid;

use duochat_types::identity::UserId;

/// Direct one-to-one chat backend.
#[derive(Parser)]
#[command(name = "duochat", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "DUOCHAT_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (defaults to config.toml, then 3000).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to config.toml, then 127.0.0.1).
        #[arg(long)]
        host: Option<String>,
    },

    /// Send a message, opening the session first if needed.
    Send {
        /// Author of the message.
        #[arg(long)]
        from: UserId,

        /// Recipient of the message.
        #[arg(long)]
        to: UserId,

        /// Message text, or a JSON document with --raw.
        text: String,

        /// Treat the text as a raw JSON payload.
        #[arg(long)]
        raw: bool,
    },

    /// List a user's conversations, most recent first.
    Sessions {
        /// Whose conversations to list.
        user: UserId,
    },

    /// Show the messages of a session, newest first.
    Messages {
        /// Session ID.
        session_id: Uuid,

        /// Show the session as this participant sees it (hides cleared messages).
        #[arg(long = "as")]
        viewer: Option<UserId>,

        /// Maximum messages to show.
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Mark one message read.
    Read {
        /// Message ID.
        message_id: Uuid,
    },

    /// Mark all of the counterpart's messages in a session read.
    ReadAll {
        /// Session ID.
        session_id: Uuid,

        /// The reading participant; their own messages are left alone.
        #[arg(long = "as")]
        reader: UserId,
    },

    /// Clear a message from one participant's view.
    Clear {
        /// Message ID.
        message_id: Uuid,

        /// Participant clearing the message.
        #[arg(long = "as")]
        user: UserId,
    },

    /// Show a user's unread message count.
    Unread {
        /// User to count for.
        user: UserId,

        /// Restrict the count to one session.
        #[arg(long)]
        session: Option<Uuid>,
    },

    /// Show or set a user's online flag.
    Presence {
        /// User to inspect or update.
        user: UserId,

        /// Mark the user online.
        #[arg(long, conflicts_with = "offline")]
        online: bool,

        /// Mark the user offline.
        #[arg(long)]
        offline: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Shorten `s` to at most `max` characters, marking the cut with "...".
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
