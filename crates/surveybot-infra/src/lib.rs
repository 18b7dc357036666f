//! Infrastructure implementations for surveybot.
//!
//! Concrete adapters for the ports defined in `surveybot-core`:
//! - `telegram`: Bot API client (`ChatTransport`) and the long-poll loop
//! - `sheets`: Google Sheets `TabularBackend` with service-account auth
//! - `csv_sink`: local append-only CSV `AppendSink` and the emergency note
//! - `config`: layered config loading (defaults, TOML file, environment)

pub mod config;
pub mod csv_sink;
pub mod sheets;
pub mod telegram;
