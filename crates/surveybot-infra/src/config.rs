//! Layered configuration loader for surveybot.
//!
//! Order: built-in defaults, then an optional `config.toml`, then environment
//! variables. A missing file means defaults; a malformed one is an error.
//! Secrets (bot token, spreadsheet credentials) only come from the
//! environment and are kept apart from [`SurveyConfig`].

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use surveybot_core::survey::Survey;
use surveybot_types::config::SurveyConfig;
use surveybot_types::error::{ConfigError, SurveyError};

pub const ENV_BOT_TOKEN: &str = "BOT_TOKEN";
pub const ENV_SHEET_NAME: &str = "GOOGLE_SHEET_NAME";
pub const ENV_SPREADSHEET_URL: &str = "SPREADSHEET_URL";
pub const ENV_CREDENTIALS: &str = "GOOGLE_CREDENTIALS_JSON";
pub const ENV_EXPIRY: &str = "SURVEY_EXPIRY_SECONDS";
pub const ENV_SWEEP_INTERVAL: &str = "SWEEP_INTERVAL_SECONDS";
pub const ENV_RESPONSES_CSV: &str = "RESPONSES_CSV";
pub const ENV_QUESTIONS_FILE: &str = "QUESTIONS_FILE";
pub const ENV_PERSIST_PARTIAL: &str = "PERSIST_PARTIAL_ON_EXPIRY";
pub const ENV_REQUIRE_PRIMARY: &str = "REQUIRE_PRIMARY_STORE";

/// Credentials read from the environment. Never logged.
pub struct Secrets {
    pub bot_token: SecretString,
    /// Service-account key as raw or base64 JSON, if configured.
    pub google_credentials: Option<SecretString>,
}

/// Read an environment variable, treating empty values as unset.
pub fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Load `SurveyConfig` from `path` (if given) and the process environment.
pub async fn load_config(path: Option<&Path>) -> Result<SurveyConfig, ConfigError> {
    let base = match path {
        Some(path) => read_config_file(path).await?,
        None => SurveyConfig::default(),
    };
    let config = apply_env(base, env_var)?;
    config.validate()?;
    Ok(config)
}

async fn read_config_file(path: &Path) -> Result<SurveyConfig, ConfigError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(SurveyConfig::default());
        }
        Err(err) => {
            return Err(ConfigError::Io(format!("{}: {err}", path.display())));
        }
    };

    toml::from_str(&content).map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))
}

/// Override `config` with whatever `lookup` finds.
pub fn apply_env<F>(mut config: SurveyConfig, lookup: F) -> Result<SurveyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(name) = lookup(ENV_SHEET_NAME) {
        config.storage.sheet_name = Some(name);
    }
    if let Some(url) = lookup(ENV_SPREADSHEET_URL) {
        config.storage.spreadsheet_url = Some(url);
    }
    if let Some(path) = lookup(ENV_RESPONSES_CSV) {
        config.storage.fallback_csv = PathBuf::from(path);
    }
    if let Some(path) = lookup(ENV_QUESTIONS_FILE) {
        config.questions_file = Some(PathBuf::from(path));
    }
    if let Some(value) = lookup(ENV_EXPIRY) {
        config.expiry_seconds = parse_seconds(ENV_EXPIRY, &value)?;
    }
    if let Some(value) = lookup(ENV_SWEEP_INTERVAL) {
        config.sweep_interval_seconds = parse_seconds(ENV_SWEEP_INTERVAL, &value)?;
    }
    if let Some(value) = lookup(ENV_PERSIST_PARTIAL) {
        config.persist_partial_on_expiry = parse_flag(ENV_PERSIST_PARTIAL, &value)?;
    }
    if let Some(value) = lookup(ENV_REQUIRE_PRIMARY) {
        config.storage.require_primary = parse_flag(ENV_REQUIRE_PRIMARY, &value)?;
    }
    Ok(config)
}

/// Read the credentials. A missing bot token is an error.
pub fn load_secrets<F>(lookup: F) -> Result<Secrets, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let bot_token = lookup(ENV_BOT_TOKEN).ok_or(ConfigError::Missing(ENV_BOT_TOKEN))?;
    Ok(Secrets {
        bot_token: SecretString::from(bot_token.trim().to_string()),
        google_credentials: lookup(ENV_CREDENTIALS).map(SecretString::from),
    })
}

/// The configured question list, or the built-in one.
pub async fn load_survey(config: &SurveyConfig) -> Result<Survey, SurveyError> {
    let Some(path) = &config.questions_file else {
        return Ok(Survey::builtin());
    };
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| SurveyError::Load(format!("{}: {err}", path.display())))?;
    Survey::from_toml_str(&content)
}

fn parse_seconds(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        reason: format!("expected a whole number of seconds, got '{value}'"),
    })
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            reason: format!("expected true or false, got '{value}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[tokio::test]
    async fn missing_file_returns_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = read_config_file(&tmp.path().join("config.toml")).await.unwrap();
        assert_eq!(config, SurveyConfig::default());
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        tokio::fs::write(&path, "this is not { valid toml !!!").await.unwrap();

        let err = read_config_file(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[tokio::test]
    async fn file_values_are_read() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        tokio::fs::write(
            &path,
            r#"
expiry_seconds = 240

[storage]
sheet_name = "Exam Anxiety"
"#,
        )
        .await
        .unwrap();

        let config = read_config_file(&path).await.unwrap();
        assert_eq!(config.expiry(), Duration::from_secs(240));
        assert_eq!(config.storage.sheet_name.as_deref(), Some("Exam Anxiety"));
    }

    #[test]
    fn env_overrides_file_values() {
        let base = SurveyConfig {
            expiry_seconds: 240,
            ..SurveyConfig::default()
        };
        let config = apply_env(
            base,
            env(&[
                (ENV_EXPIRY, "60"),
                (ENV_SHEET_NAME, "Responses"),
                (ENV_RESPONSES_CSV, "/data/out.csv"),
                (ENV_REQUIRE_PRIMARY, "true"),
                (ENV_PERSIST_PARTIAL, "1"),
            ]),
        )
        .unwrap();

        assert_eq!(config.expiry_seconds, 60);
        assert_eq!(config.sweep_interval_seconds, 10);
        assert_eq!(config.storage.sheet_name.as_deref(), Some("Responses"));
        assert_eq!(config.storage.fallback_csv, PathBuf::from("/data/out.csv"));
        assert!(config.storage.require_primary);
        assert!(config.persist_partial_on_expiry);
    }

    #[test]
    fn bad_env_values_are_rejected() {
        let err = apply_env(SurveyConfig::default(), env(&[(ENV_EXPIRY, "3 minutes")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: ENV_EXPIRY, .. }));

        let err =
            apply_env(SurveyConfig::default(), env(&[(ENV_REQUIRE_PRIMARY, "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: ENV_REQUIRE_PRIMARY, .. }));
    }

    #[test]
    fn secrets_require_bot_token() {
        let err = load_secrets(env(&[])).err().unwrap();
        assert!(matches!(err, ConfigError::Missing("BOT_TOKEN")));

        let secrets = load_secrets(env(&[(ENV_BOT_TOKEN, " 123:abc\n")])).unwrap();
        assert_eq!(secrets.bot_token.expose_secret(), "123:abc");
        assert!(secrets.google_credentials.is_none());
    }

    #[tokio::test]
    async fn survey_defaults_to_builtin_questions() {
        let survey = load_survey(&SurveyConfig::default()).await.unwrap();
        assert_eq!(survey.len(), Survey::builtin().len());
    }

    #[tokio::test]
    async fn survey_loads_from_questions_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("questions.toml");
        tokio::fs::write(&path, "questions = [\"First\", \"Second\"]\n")
            .await
            .unwrap();

        let config = SurveyConfig {
            questions_file: Some(path),
            ..SurveyConfig::default()
        };
        let survey = load_survey(&config).await.unwrap();
        assert_eq!(survey.len(), 2);

        let missing = SurveyConfig {
            questions_file: Some(tmp.path().join("nope.toml")),
            ..SurveyConfig::default()
        };
        assert!(matches!(
            load_survey(&missing).await,
            Err(SurveyError::Load(_))
        ));
    }
}
