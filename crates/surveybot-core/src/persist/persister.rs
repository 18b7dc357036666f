//! Two-tier record persister.
//!
//! The tier is chosen exactly once, when the persister is built: either the
//! primary backend opened successfully, or the whole process writes to the
//! local sink from then on. The primary is never re-attempted mid-run.
//!
//! On the primary path `upsert` is find-or-append keyed by identity, so
//! repeating it for the same participant overwrites their row. Any error
//! during lookup or update degrades to a plain append; this can leave a
//! duplicate row for one participant, which is accepted in exchange for
//! never dropping a record.
//!
//! Upserts for the same identity are serialized here, so the sweeper's
//! partial records and the dispatcher's completed ones cannot race each
//! other into two appended rows.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use surveybot_types::error::PersistError;
use surveybot_types::record::Record;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::backend::{AppendSink, TabularBackend};

/// Which tier the persister was pinned to at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersisterMode {
    Primary,
    Fallback,
}

impl fmt::Display for PersisterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersisterMode::Primary => write!(f, "primary"),
            PersisterMode::Fallback => write!(f, "fallback"),
        }
    }
}

/// How a record ended up being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// An existing row for the identity was overwritten.
    Updated,
    /// No row existed; a new one was appended.
    Appended,
    /// Lookup or update failed and the record was appended instead.
    AppendedAfterError,
    /// The primary could not take the record at all; it went to the local sink.
    Spilled,
    /// The persister runs in fallback mode.
    WrittenToFallback,
}

impl fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UpsertOutcome::Updated => "updated",
            UpsertOutcome::Appended => "appended",
            UpsertOutcome::AppendedAfterError => "appended_after_error",
            UpsertOutcome::Spilled => "spilled",
            UpsertOutcome::WrittenToFallback => "written_to_fallback",
        };
        f.write_str(s)
    }
}

enum Tier<B> {
    Primary(B),
    Fallback { reason: String },
}

pub struct RecordPersister<B, S> {
    tier: Tier<B>,
    sink: S,
    question_count: usize,
    key_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<B: TabularBackend, S: AppendSink> RecordPersister<B, S> {
    pub fn primary(backend: B, sink: S, question_count: usize) -> Self {
        Self {
            tier: Tier::Primary(backend),
            sink,
            question_count,
            key_locks: DashMap::new(),
        }
    }

    pub fn fallback(sink: S, question_count: usize, reason: impl Into<String>) -> Self {
        Self {
            tier: Tier::Fallback {
                reason: reason.into(),
            },
            sink,
            question_count,
            key_locks: DashMap::new(),
        }
    }

    /// Open the primary backend and pick the tier for the process lifetime.
    ///
    /// With `require_primary` a failed open is returned as the error;
    /// otherwise the persister is pinned to `sink`.
    pub async fn initialize<F>(
        open_primary: F,
        sink: S,
        question_count: usize,
        require_primary: bool,
    ) -> Result<Self, PersistError>
    where
        F: Future<Output = Result<B, PersistError>>,
    {
        match open_primary.await {
            Ok(backend) => {
                info!("primary record store ready");
                Ok(Self::primary(backend, sink, question_count))
            }
            Err(err) if require_primary => {
                error!(error = %err, "primary record store unavailable");
                Err(err)
            }
            Err(err) => {
                error!(error = %err, "primary record store unavailable");
                warn!(sink = %sink.describe(), "falling back to local record sink for this run");
                Ok(Self::fallback(sink, question_count, err.to_string()))
            }
        }
    }

    pub fn mode(&self) -> PersisterMode {
        match self.tier {
            Tier::Primary(_) => PersisterMode::Primary,
            Tier::Fallback { .. } => PersisterMode::Fallback,
        }
    }

    /// Why the primary was abandoned, in fallback mode.
    pub fn fallback_reason(&self) -> Option<&str> {
        match &self.tier {
            Tier::Primary(_) => None,
            Tier::Fallback { reason } => Some(reason),
        }
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }

    /// Write `record`, overwriting any existing row for its identity.
    ///
    /// Returns an error only when the record could not be written anywhere.
    pub async fn upsert(&self, record: &Record) -> Result<UpsertOutcome, PersistError> {
        let key = record.key();
        let lock = Arc::clone(self.key_locks.entry(key.clone()).or_default().value());

        let result = {
            let _guard = lock.lock().await;
            self.write(record, &key).await
        };

        drop(lock);
        self.key_locks
            .remove_if(&key, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    async fn write(&self, record: &Record, key: &str) -> Result<UpsertOutcome, PersistError> {
        let columns = record.to_columns(self.question_count);

        let backend = match &self.tier {
            Tier::Primary(backend) => backend,
            Tier::Fallback { .. } => {
                self.sink.append(&columns).await?;
                return Ok(UpsertOutcome::WrittenToFallback);
            }
        };

        match find_or_append(backend, key, &columns).await {
            Ok(outcome) => return Ok(outcome),
            Err(err) => {
                warn!(participant = %key, error = %err, "upsert failed, appending instead");
            }
        }

        match backend.append_row(&columns).await {
            Ok(()) => Ok(UpsertOutcome::AppendedAfterError),
            Err(err) => {
                error!(
                    participant = %key,
                    error = %err,
                    sink = %self.sink.describe(),
                    "append failed, spilling record to local sink"
                );
                self.sink.append(&columns).await?;
                Ok(UpsertOutcome::Spilled)
            }
        }
    }
}

async fn find_or_append<B: TabularBackend>(
    backend: &B,
    key: &str,
    columns: &[String],
) -> Result<UpsertOutcome, PersistError> {
    match backend.find_row_by_key(key).await? {
        Some(row) => {
            backend.update_row(row, columns).await?;
            Ok(UpsertOutcome::Updated)
        }
        None => {
            backend.append_row(columns).await?;
            Ok(UpsertOutcome::Appended)
        }
    }
}
