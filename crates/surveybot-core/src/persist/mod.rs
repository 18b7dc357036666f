//! Record persistence: port traits and the two-tier persister.
//!
//! `TabularBackend` is the primary, key-addressable remote store (a
//! spreadsheet). `AppendSink` is the local append-only fallback. Both are
//! implemented in `surveybot-infra`; `RecordPersister` owns the upsert and
//! fallback policy.

mod backend;
mod persister;

pub use backend::{AppendSink, RowRef, TabularBackend};
pub use persister::{PersisterMode, RecordPersister, UpsertOutcome};
