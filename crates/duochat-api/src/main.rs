//! duochat CLI and REST API entry point.
//!
//! Binary name: `duochat`
//!
//! Parses CLI arguments, initializes database and services, then dispatches
//! to the appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use duochat_observe::tracing_setup::{filter_for_verbosity, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = filter_for_verbosity(cli.verbose, cli.quiet);
    init_tracing(filter, cli.otel).map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "duochat", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;
    let result = run(cli, state).await;

    shutdown_tracing();
    result
}

async fn run(cli: Cli, state: AppState) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port, host } => {
            let host = host.unwrap_or_else(|| state.config.server.host.clone());
            let port = port.unwrap_or(state.config.server.port);
            serve(state, &host, port).await?;
        }

        Commands::Send { from, to, text, raw } => {
            cli::session::send(&state, &from, &to, &text, raw, cli.json).await?;
        }

        Commands::Sessions { user } => {
            cli::session::list_sessions(&state, &user, cli.json).await?;
        }

        Commands::Messages { session_id, viewer, limit } => {
            cli::message::list_messages(&state, &session_id, viewer.as_ref(), limit, cli.json).await?;
        }

        Commands::Read { message_id } => {
            cli::message::mark_read(&state, &message_id, cli.json).await?;
        }

        Commands::ReadAll { session_id, reader } => {
            cli::message::mark_all_read(&state, &session_id, &reader, cli.json).await?;
        }

        Commands::Clear { message_id, user } => {
            cli::message::clear(&state, &message_id, &user, cli.json).await?;
        }

        Commands::Unread { user, session } => {
            cli::session::unread(&state, &user, session, cli.json).await?;
        }

        Commands::Presence { user, online, offline } => {
            let set = match (online, offline) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            cli::presence::presence(&state, &user, set, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled in main"),
    }

    Ok(())
}

async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} duochat API listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!(
        "  {}",
        console::style(format!("Data directory: {}", state.data_dir.display())).dim()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    spawn_event_logger(&state);
    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("\n  Server stopped.");
    Ok(())
}

/// Log every committed chat event. Delivery layers subscribe the same way.
fn spawn_event_logger(state: &AppState) {
    let mut rx = state.chat_service.events().subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    tracing::debug!(session_id = %event.session_id(), ?event, "Chat event");
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event logger lagged behind");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
