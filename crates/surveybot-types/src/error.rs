use thiserror::Error;

/// Errors from session lookups and input handling.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// No session exists for the identity (expired or never started).
    #[error("session not found")]
    NotFound,

    #[error("session expired")]
    Expired,

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Errors from writing survey records.
#[derive(Debug, Error)]
pub enum PersistError {
    /// A remote call failed mid-run; the persister degrades to append.
    #[error("transient store error: {0}")]
    Transient(String),

    /// The store cannot be used at all (bad credentials, unreachable).
    #[error("store unavailable: {0}")]
    Fatal(String),

    #[error("local file error: {0}")]
    Io(String),
}

impl From<std::io::Error> for PersistError {
    fn from(err: std::io::Error) -> Self {
        PersistError::Io(err.to_string())
    }
}

/// Errors from the chat transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("API error {code}: {description}")]
    Api { code: i64, description: String },

    /// The bot credential was rejected. Fatal at startup.
    #[error("bot token rejected")]
    Unauthorized,

    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("config file error: {0}")]
    Io(String),
}

/// Errors from loading the survey definition.
#[derive(Debug, Error)]
pub enum SurveyError {
    #[error("survey has no questions")]
    Empty,

    #[error("failed to load questions: {0}")]
    Load(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persist_error_display() {
        let err = PersistError::Transient("quota exceeded".to_string());
        assert_eq!(err.to_string(), "transient store error: quota exceeded");
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Api {
            code: 403,
            description: "bot was blocked by the user".to_string(),
        };
        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("blocked"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Missing("BOT_TOKEN");
        assert_eq!(err.to_string(), "missing required setting: BOT_TOKEN");
    }

    #[test]
    fn test_io_error_converts_to_persist_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: PersistError = io.into();
        assert!(matches!(err, PersistError::Io(_)));
    }
}
