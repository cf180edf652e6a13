//! Shared domain types for duochat.
//!
//! This crate contains the data model of the direct-chat engine: user
//! identities, sessions, messages, events, presence, configuration, and the
//! error types shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod event;
pub mod identity;
pub mod presence;
