//! Configuration types for surveybot.
//!
//! `SurveyConfig` is the non-secret part of the runtime configuration. It is
//! read from an optional `config.toml` and then overridden by environment
//! variables (see `surveybot-infra::config`). Credentials never live here.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level runtime configuration. All fields have defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyConfig {
    /// Seconds after `/start` before a session expires.
    #[serde(default = "default_expiry_seconds")]
    pub expiry_seconds: u64,

    /// Seconds between expiry sweeps.
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,

    /// Optional TOML file replacing the built-in question list.
    #[serde(default)]
    pub questions_file: Option<PathBuf>,

    /// Upsert what an expired session collected before evicting it.
    #[serde(default)]
    pub persist_partial_on_expiry: bool,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,
}

fn default_expiry_seconds() -> u64 {
    180
}

fn default_sweep_interval_seconds() -> u64 {
    10
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            expiry_seconds: default_expiry_seconds(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
            questions_file: None,
            persist_partial_on_expiry: false,
            storage: StorageConfig::default(),
            telegram: TelegramConfig::default(),
        }
    }
}

impl SurveyConfig {
    pub fn expiry(&self) -> Duration {
        Duration::from_secs(self.expiry_seconds)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_seconds("expiry_seconds", self.expiry_seconds)?;
        check_seconds("sweep_interval_seconds", self.sweep_interval_seconds)?;
        check_seconds("telegram.poll_timeout_seconds", self.telegram.poll_timeout_seconds)?;
        Ok(())
    }
}

/// Upper bound for any configured interval: one week.
pub const MAX_INTERVAL_SECONDS: u64 = 7 * 24 * 60 * 60;

fn check_seconds(key: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            key,
            reason: "must be greater than zero".to_string(),
        });
    }
    if value > MAX_INTERVAL_SECONDS {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("must be at most {MAX_INTERVAL_SECONDS} seconds"),
        });
    }
    Ok(())
}

/// Where survey records are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Spreadsheet title to open (or create) in the primary store.
    #[serde(default)]
    pub sheet_name: Option<String>,

    /// Spreadsheet URL or bare id; takes precedence over a name lookup miss.
    #[serde(default)]
    pub spreadsheet_url: Option<String>,

    /// Local CSV used when the primary store is unavailable at startup.
    #[serde(default = "default_fallback_csv")]
    pub fallback_csv: PathBuf,

    /// Diagnostic file written once when falling back.
    #[serde(default = "default_emergency_file")]
    pub emergency_file: PathBuf,

    /// Exit instead of falling back when the primary store fails to open.
    #[serde(default)]
    pub require_primary: bool,
}

fn default_fallback_csv() -> PathBuf {
    PathBuf::from("responses.csv")
}

fn default_emergency_file() -> PathBuf {
    PathBuf::from("emergency_fallback.csv")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sheet_name: None,
            spreadsheet_url: None,
            fallback_csv: default_fallback_csv(),
            emergency_file: default_emergency_file(),
            require_primary: false,
        }
    }
}

/// Telegram Bot API connection settings (the token is a secret, see infra).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Long-poll timeout passed to `getUpdates`.
    #[serde(default = "default_poll_timeout_seconds")]
    pub poll_timeout_seconds: u64,
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout_seconds() -> u64 {
    30
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            poll_timeout_seconds: default_poll_timeout_seconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_survey_window() {
        let config = SurveyConfig::default();
        assert_eq!(config.expiry(), Duration::from_secs(180));
        assert_eq!(config.sweep_interval(), Duration::from_secs(10));
        assert_eq!(config.storage.fallback_csv, PathBuf::from("responses.csv"));
        assert!(!config.storage.require_primary);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: SurveyConfig = toml::from_str("").unwrap();
        assert_eq!(config, SurveyConfig::default());
    }

    #[test]
    fn test_deserialize_with_values() {
        let toml_str = r#"
expiry_seconds = 300
persist_partial_on_expiry = true

[storage]
sheet_name = "Test Anxiety"
require_primary = true

[telegram]
poll_timeout_seconds = 5
"#;
        let config: SurveyConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.expiry_seconds, 300);
        assert_eq!(config.sweep_interval_seconds, 10);
        assert!(config.persist_partial_on_expiry);
        assert_eq!(config.storage.sheet_name.as_deref(), Some("Test Anxiety"));
        assert!(config.storage.require_primary);
        assert_eq!(config.telegram.poll_timeout_seconds, 5);
        assert_eq!(config.telegram.api_base, "https://api.telegram.org");
    }

    #[test]
    fn test_validate_rejects_zero_intervals() {
        let config = SurveyConfig {
            expiry_seconds: 0,
            ..SurveyConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "expiry_seconds", .. })
        ));

        let config = SurveyConfig {
            sweep_interval_seconds: 0,
            ..SurveyConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_intervals_beyond_a_week() {
        let config = SurveyConfig {
            sweep_interval_seconds: u64::MAX,
            ..SurveyConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "sweep_interval_seconds", .. })
        ));

        let config = SurveyConfig {
            expiry_seconds: MAX_INTERVAL_SECONDS + 1,
            ..SurveyConfig::default()
        };
        assert!(config.validate().is_err());

        let config = SurveyConfig {
            expiry_seconds: MAX_INTERVAL_SECONDS,
            ..SurveyConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
