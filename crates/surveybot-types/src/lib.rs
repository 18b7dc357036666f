//! Shared domain types for surveybot.
//!
//! This crate contains the core domain types used across the survey engine:
//! participant identity, answers, sessions, persisted records, transport
//! events, configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde and thiserror.

pub mod answer;
pub mod config;
pub mod error;
pub mod event;
pub mod identity;
pub mod record;
pub mod session;
