//! Observability setup for duochat: structured logging and optional
//! OpenTelemetry span export.

pub mod tracing_setup;
