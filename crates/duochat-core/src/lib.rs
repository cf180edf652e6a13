//! Chat engine logic and repository trait definitions for duochat.
//!
//! This crate defines the "ports" (repository traits) that the infrastructure
//! layer implements, plus the services that enforce the session and message
//! invariants on top of them. It depends only on `duochat-types` -- never on
//! `duochat-infra` or any database/IO crate.

pub mod chat;
pub mod event;
pub mod presence;
