//! Infrastructure layer for duochat.
//!
//! Contains implementations of the repository traits defined in `duochat-core`
//! (SQLite storage) plus data-directory and config-file resolution.

pub mod config;
pub mod filesystem;
pub mod sqlite;
