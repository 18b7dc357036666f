//! Local CSV storage for survey records.
//!
//! `CsvFileSink` is the append-only fallback used when the spreadsheet
//! cannot be opened at startup (and the spill target when a degraded append
//! fails). Rows use the same column layout as the spreadsheet.

use std::path::{Path, PathBuf};

use surveybot_core::persist::AppendSink;
use surveybot_types::error::PersistError;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Appends one CSV line per record to a file.
pub struct CsvFileSink {
    path: PathBuf,
    // Serializes appends from concurrent participant workers and the sweeper.
    write_lock: Mutex<()>,
}

impl CsvFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AppendSink for CsvFileSink {
    async fn append(&self, columns: &[String]) -> Result<(), PersistError> {
        let line = format_row(columns);
        let _guard = self.write_lock.lock().await;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Overwrite `path` with a `timestamp,error_details` note explaining why the
/// spreadsheet was abandoned.
pub async fn write_emergency_note(path: &Path, error_details: &str) -> Result<(), PersistError> {
    let now = chrono::Utc::now();
    let timestamp = format!(
        "{}.{:03}",
        now.timestamp(),
        now.timestamp_subsec_millis()
    );
    let content = format!(
        "{}{}",
        format_row(&["timestamp".to_string(), "error_details".to_string()]),
        format_row(&[timestamp, error_details.to_string()])
    );
    tokio::fs::write(path, content).await?;
    Ok(())
}

fn format_row(columns: &[String]) -> String {
    let mut line = columns
        .iter()
        .map(|cell| escape(cell))
        .collect::<Vec<_>>()
        .join(",");
    line.push_str("\r\n");
    line
}

fn escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
