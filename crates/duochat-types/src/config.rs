//! Configuration types for duochat.
//!
//! `ChatConfig` represents the `config.toml` in the data directory. Every
//! field has a default, so an empty or missing file is valid.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Buffer size of the chat event bus. Slow subscribers lag past this.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Upper bound on messages returned by a single list request.
    #[serde(default = "default_message_page_limit")]
    pub message_page_limit: usize,

    #[serde(default)]
    pub server: ServerConfig,
}

fn default_event_capacity() -> usize {
    1024
}

fn default_message_page_limit() -> usize {
    100
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            event_capacity: default_event_capacity(),
            message_page_limit: default_message_page_limit(),
            server: ServerConfig::default(),
        }
    }
}

/// REST API bind address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_config_default_values() {
        let config = ChatConfig::default();
        assert_eq!(config.event_capacity, 1024);
        assert_eq!(config.message_page_limit, 100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_chat_config_deserialize_empty() {
        let config: ChatConfig = toml::from_str("").unwrap();
        assert_eq!(config.event_capacity, 1024);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_chat_config_deserialize_with_values() {
        let toml_str = r#"
event_capacity = 64
message_page_limit = 20

[server]
host = "0.0.0.0"
port = 8080
"#;
        let config: ChatConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.event_capacity, 64);
        assert_eq!(config.message_page_limit, 20);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_partial_server_section_keeps_defaults() {
        let config: ChatConfig = toml::from_str("[server]\nport = 9000\n").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
    }
}
