//! Direct chat: session registry, message store, and unread aggregation.
//!
//! `repository` defines the storage port, `validation` the creation-time
//! invariants, and `service` the operations callers use.

pub mod repository;
pub mod service;
pub mod validation;
