//! Application state wiring the engine to its adapters.
//!
//! The core engine is generic over transport/backend/sink traits; AppState
//! pins it to Telegram, Google Sheets and the local CSV file.

use std::sync::Arc;

use anyhow::Context;
use secrecy::{ExposeSecret, SecretString};
use surveybot_core::dispatch::Dispatcher;
use surveybot_core::persist::{PersisterMode, RecordPersister};
use surveybot_core::store::SessionStore;
use surveybot_core::survey::Survey;
use surveybot_core::sweeper::ExpirySweeper;
use surveybot_infra::csv_sink::{CsvFileSink, write_emergency_note};
use surveybot_infra::sheets::{ServiceAccountKey, SheetsBackend, SpreadsheetTarget};
use surveybot_infra::telegram::TelegramClient;
use surveybot_types::config::SurveyConfig;
use surveybot_types::error::PersistError;
use tracing::{info, warn};

pub type ConcretePersister = RecordPersister<SheetsBackend, CsvFileSink>;
pub type ConcreteDispatcher = Dispatcher<TelegramClient, SheetsBackend, CsvFileSink>;
pub type ConcreteSweeper = ExpirySweeper<TelegramClient, SheetsBackend, CsvFileSink>;

pub struct AppState {
    pub config: SurveyConfig,
    pub survey: Arc<Survey>,
    pub store: Arc<SessionStore>,
    pub telegram: Arc<TelegramClient>,
    pub persister: Arc<ConcretePersister>,
}

impl AppState {
    /// Open the record store (falling back to CSV unless the primary is
    /// required) and build the shared engine pieces around `telegram`.
    pub async fn init(
        config: SurveyConfig,
        survey: Survey,
        telegram: TelegramClient,
        credentials: Option<&SecretString>,
    ) -> anyhow::Result<Self> {
        if !survey.fits_row() {
            warn!(
                questions = survey.len(),
                "survey has more questions than a record row holds; trailing columns will be dropped"
            );
        }

        let persister = open_persister(&config, credentials, survey.len()).await?;
        if let Some(reason) = persister.fallback_reason() {
            let path = &config.storage.emergency_file;
            match write_emergency_note(path, reason).await {
                Ok(()) => info!(path = %path.display(), "wrote emergency fallback note"),
                Err(err) => warn!(path = %path.display(), error = %err, "failed to write emergency fallback note"),
            }
        }

        Ok(Self {
            survey: Arc::new(survey),
            store: Arc::new(SessionStore::new()),
            telegram: Arc::new(telegram),
            persister: Arc::new(persister),
            config,
        })
    }

    pub fn dispatcher(&self) -> ConcreteDispatcher {
        Dispatcher::new(
            Arc::clone(&self.store),
            Arc::clone(&self.survey),
            Arc::clone(&self.telegram),
            Arc::clone(&self.persister),
            Arc::new(surveybot_core::clock::TokioClock),
            self.config.expiry(),
        )
    }

    pub fn sweeper(&self) -> ConcreteSweeper {
        ExpirySweeper::new(
            Arc::clone(&self.store),
            Arc::clone(&self.telegram),
            Arc::clone(&self.persister),
            Arc::new(surveybot_core::clock::TokioClock),
            self.config.expiry(),
            self.config.sweep_interval(),
        )
        .with_partial_persistence(self.config.persist_partial_on_expiry)
    }

    pub fn storage_mode(&self) -> PersisterMode {
        self.persister.mode()
    }
}

/// Decide the record store for this process.
///
/// Missing or unusable spreadsheet credentials count as a failed open.
pub async fn open_persister(
    config: &SurveyConfig,
    credentials: Option<&SecretString>,
    question_count: usize,
) -> anyhow::Result<ConcretePersister> {
    let sink = CsvFileSink::new(&config.storage.fallback_csv);
    let target = SpreadsheetTarget::from(&config.storage);

    let open_primary = async {
        let encoded = credentials.ok_or_else(|| {
            PersistError::Fatal("GOOGLE_CREDENTIALS_JSON is not set".to_string())
        })?;
        let key = ServiceAccountKey::decode(encoded.expose_secret())?;
        SheetsBackend::connect(key, &target).await
    };

    RecordPersister::initialize(
        open_primary,
        sink,
        question_count,
        config.storage.require_primary,
    )
    .await
    .context("spreadsheet is required but could not be opened")
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::TempDir;

    use super::*;

    fn config_in(dir: &Path, require_primary: bool) -> SurveyConfig {
        let mut config = SurveyConfig::default();
        config.storage.fallback_csv = dir.join("responses.csv");
        config.storage.emergency_file = dir.join("emergency_fallback.csv");
        config.storage.sheet_name = Some("Test Anxiety".to_string());
        config.storage.require_primary = require_primary;
        config
    }

    fn telegram(config: &SurveyConfig) -> TelegramClient {
        TelegramClient::new(SecretString::from("123:abc"), &config.telegram)
    }

    #[tokio::test]
    async fn missing_credentials_fall_back_to_csv() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path(), false);

        let persister = open_persister(&config, None, 5).await.unwrap();

        assert_eq!(persister.mode(), PersisterMode::Fallback);
        assert!(
            persister
                .fallback_reason()
                .unwrap()
                .contains("GOOGLE_CREDENTIALS_JSON")
        );
    }

    #[tokio::test]
    async fn unreadable_credentials_fall_back_to_csv() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path(), false);
        let garbage = SecretString::from("not a key");

        let persister = open_persister(&config, Some(&garbage), 5).await.unwrap();
        assert_eq!(persister.mode(), PersisterMode::Fallback);
    }

    #[tokio::test]
    async fn missing_credentials_are_fatal_when_primary_required() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path(), true);

        let err = open_persister(&config, None, 5).await.err().unwrap();

        let message = format!("{err:#}");
        assert!(message.contains("spreadsheet is required"));
        assert!(message.contains("GOOGLE_CREDENTIALS_JSON"));
    }

    #[tokio::test]
    async fn fallback_start_writes_emergency_note() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path(), false);
        let client = telegram(&config);

        let state = AppState::init(config, Survey::builtin(), client, None)
            .await
            .unwrap();

        assert_eq!(state.storage_mode(), PersisterMode::Fallback);
        let note = tokio::fs::read_to_string(tmp.path().join("emergency_fallback.csv"))
            .await
            .unwrap();
        assert!(note.starts_with("timestamp,error_details"));
        assert!(note.contains("GOOGLE_CREDENTIALS_JSON"));
    }

    #[tokio::test]
    async fn required_primary_stops_init_without_note() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path(), true);
        let client = telegram(&config);

        let result = AppState::init(config, Survey::builtin(), client, None).await;

        assert!(result.is_err());
        assert!(!tmp.path().join("emergency_fallback.csv").exists());
    }
}
