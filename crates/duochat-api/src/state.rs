//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! `ChatService` is generic over its repository; AppState pins it to SQLite.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use duochat_core::chat::service::ChatService;
use duochat_core::event::EventBus;
use duochat_infra::config::load_chat_config;
use duochat_infra::filesystem::{ensure_data_dir, resolve_data_dir};
use duochat_infra::sqlite::chat::SqliteChatRepository;
use duochat_infra::sqlite::pool::{DatabasePool, database_url};
use duochat_infra::sqlite::presence::SqlitePresenceRepository;
use duochat_types::config::ChatConfig;

/// Concrete type alias for the chat service pinned to the SQLite repository.
pub type ConcreteChatService = ChatService<SqliteChatRepository>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub presence_repo: Arc<SqlitePresenceRepository>,
    pub config: Arc<ChatConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: resolve the data dir, load config,
    /// connect to the database, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        ensure_data_dir(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let config = load_chat_config(&data_dir).await;

        let db_pool = DatabasePool::new(&database_url(&data_dir))
            .await
            .context("failed to open duochat database")?;

        Ok(Self::from_parts(db_pool, config, data_dir))
    }

    /// Wire services over an already-open pool.
    pub fn from_parts(db_pool: DatabasePool, config: ChatConfig, data_dir: PathBuf) -> Self {
        let events = EventBus::new(config.event_capacity);
        let chat_service = ChatService::new(SqliteChatRepository::new(db_pool.clone()), events);
        let presence_repo = SqlitePresenceRepository::new(db_pool.clone());

        Self {
            chat_service: Arc::new(chat_service),
            presence_repo: Arc::new(presence_repo),
            config: Arc::new(config),
            data_dir,
            db_pool,
        }
    }
}
