//! In-memory fakes of the ports, for tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use surveybot_types::error::{PersistError, TransportError};
use surveybot_types::event::OutboundMessage;
use surveybot_types::identity::ParticipantId;

use crate::persist::{AppendSink, RowRef, TabularBackend};
use crate::transport::ChatTransport;

#[derive(Default)]
struct TransportLog {
    sent: Vec<(ParticipantId, OutboundMessage)>,
    acked: Vec<String>,
    unreachable: HashSet<ParticipantId>,
}

/// Records every message; can be told some participants are unreachable.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    inner: Arc<Mutex<TransportLog>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn make_unreachable(&self, participant: ParticipantId) {
        self.inner.lock().unwrap().unreachable.insert(participant);
    }

    pub fn sent(&self) -> Vec<(ParticipantId, OutboundMessage)> {
        self.inner.lock().unwrap().sent.clone()
    }

    pub fn texts_to(&self, participant: ParticipantId) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .sent
            .iter()
            .filter(|(to, _)| *to == participant)
            .map(|(_, msg)| msg.text.clone())
            .collect()
    }

    pub fn acked(&self) -> Vec<String> {
        self.inner.lock().unwrap().acked.clone()
    }
}

impl ChatTransport for RecordingTransport {
    async fn send(&self, to: ParticipantId, message: &OutboundMessage) -> Result<(), TransportError> {
        let mut log = self.inner.lock().unwrap();
        if log.unreachable.contains(&to) {
            return Err(TransportError::Api {
                code: 403,
                description: "Forbidden: bot was blocked by the user".to_string(),
            });
        }
        log.sent.push((to, message.clone()));
        Ok(())
    }

    async fn acknowledge(&self, callback_id: &str) -> Result<(), TransportError> {
        self.inner.lock().unwrap().acked.push(callback_id.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct Table {
    rows: Vec<Vec<String>>,
    fail_next_lookup: bool,
    fail_next_update: bool,
    failing_appends: usize,
}

/// A spreadsheet held in memory, with injectable failures.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<Table>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        self.inner.lock().unwrap().rows.clone()
    }

    pub fn fail_next_lookup(&self) {
        self.inner.lock().unwrap().fail_next_lookup = true;
    }

    pub fn fail_next_update(&self) {
        self.inner.lock().unwrap().fail_next_update = true;
    }

    pub fn fail_appends(&self, count: usize) {
        self.inner.lock().unwrap().failing_appends = count;
    }
}

impl TabularBackend for MemoryBackend {
    async fn find_row_by_key(&self, key: &str) -> Result<Option<RowRef>, PersistError> {
        let found = {
            let mut table = self.inner.lock().unwrap();
            if std::mem::take(&mut table.fail_next_lookup) {
                return Err(PersistError::Transient("lookup failed".to_string()));
            }
            table
                .rows
                .iter()
                .position(|row| row.first().map(String::as_str) == Some(key))
                .map(|index| RowRef(index as u32 + 1))
        };
        // Like a network round trip, the answer can go stale before it is used.
        tokio::task::yield_now().await;
        Ok(found)
    }

    async fn update_row(&self, row: RowRef, columns: &[String]) -> Result<(), PersistError> {
        let mut table = self.inner.lock().unwrap();
        if std::mem::take(&mut table.fail_next_update) {
            return Err(PersistError::Transient("update failed".to_string()));
        }
        let index = row.0 as usize - 1;
        table.rows[index] = columns.to_vec();
        Ok(())
    }

    async fn append_row(&self, columns: &[String]) -> Result<(), PersistError> {
        let mut table = self.inner.lock().unwrap();
        if table.failing_appends > 0 {
            table.failing_appends -= 1;
            return Err(PersistError::Transient("append failed".to_string()));
        }
        table.rows.push(columns.to_vec());
        Ok(())
    }
}

#[derive(Default)]
struct SinkState {
    rows: Vec<Vec<String>>,
    failing: bool,
}

/// Append-only local sink held in memory.
#[derive(Clone, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<SinkState>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        self.inner.lock().unwrap().rows.clone()
    }

    pub fn fail_all(&self) {
        self.inner.lock().unwrap().failing = true;
    }
}

impl AppendSink for MemorySink {
    async fn append(&self, columns: &[String]) -> Result<(), PersistError> {
        let mut state = self.inner.lock().unwrap();
        if state.failing {
            return Err(PersistError::Io("disk full".to_string()));
        }
        state.rows.push(columns.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
