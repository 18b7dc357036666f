//! Observability setup for surveybot: structured logging via `tracing`,
//! with optional OpenTelemetry span export.

pub mod tracing_setup;

pub use tracing_setup::{LogFormat, init_tracing, shutdown_tracing};
