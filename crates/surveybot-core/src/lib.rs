//! Survey session engine for surveybot.
//!
//! This crate owns everything with real invariants: the concurrent session
//! store, the pure state machine, the expiry sweeper, the two-tier record
//! persister, and the dispatcher that ties them to a chat transport. It
//! defines the "ports" (`ChatTransport`, `TabularBackend`, `AppendSink`) that
//! `surveybot-infra` implements, and depends on no HTTP or file I/O crate.

pub mod clock;
pub mod dispatch;
pub mod machine;
pub mod persist;
pub mod prompts;
pub mod store;
pub mod survey;
pub mod sweeper;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;
