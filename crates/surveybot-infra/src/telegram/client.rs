//! TelegramClient -- concrete [`ChatTransport`] over the Telegram Bot API.
//!
//! The bot token is part of every method URL, so it is held as a
//! [`SecretString`] and stripped from reqwest errors before they are
//! surfaced or logged.

use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use surveybot_core::transport::ChatTransport;
use surveybot_types::config::TelegramConfig;
use surveybot_types::error::TransportError;
use surveybot_types::event::OutboundMessage;
use surveybot_types::identity::ParticipantId;

use super::mapping::to_send_request;
use super::types::{AnswerCallbackQueryRequest, ApiResponse, GetUpdatesRequest, Update, User};

/// Timeout for calls other than the long poll.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Extra slack on top of the long-poll timeout before the HTTP call gives up.
const POLL_SLACK: Duration = Duration::from_secs(10);

const ALLOWED_UPDATES: &[&str] = &["message", "callback_query"];

pub struct TelegramClient {
    http: reqwest::Client,
    token: SecretString,
    api_base: String,
    poll_timeout: Duration,
}

impl TelegramClient {
    pub fn new(token: SecretString, config: &TelegramConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("surveybot/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            http,
            token,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            poll_timeout: Duration::from_secs(config.poll_timeout_seconds),
        }
    }

    /// Validate the token. A rejected token is [`TransportError::Unauthorized`].
    pub async fn get_me(&self) -> Result<User, TransportError> {
        self.call("getMe", &serde_json::json!({}), REQUEST_TIMEOUT)
            .await
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, TransportError> {
        let body = GetUpdatesRequest {
            offset,
            timeout: self.poll_timeout.as_secs(),
            allowed_updates: ALLOWED_UPDATES,
        };
        self.call("getUpdates", &body, self.poll_timeout + POLL_SLACK)
            .await
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_base,
            self.token.expose_secret(),
            method
        )
    }

    async fn call<Req, Resp>(
        &self,
        method: &str,
        body: &Req,
        timeout: Duration,
    ) -> Result<Resp, TransportError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.method_url(method))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.without_url().to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Http(e.without_url().to_string()))?;

        decode_response(status, &text)
    }
}

// No Debug derive: the struct holds the bot token.

impl ChatTransport for TelegramClient {
    async fn send(&self, to: ParticipantId, message: &OutboundMessage) -> Result<(), TransportError> {
        let body = to_send_request(to, message);
        let _: serde_json::Value = self.call("sendMessage", &body, REQUEST_TIMEOUT).await?;
        Ok(())
    }

    async fn acknowledge(&self, callback_id: &str) -> Result<(), TransportError> {
        let body = AnswerCallbackQueryRequest {
            callback_query_id: callback_id,
        };
        let _: bool = self
            .call("answerCallbackQuery", &body, REQUEST_TIMEOUT)
            .await?;
        Ok(())
    }
}

/// Interpret a Bot API response body.
fn decode_response<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, TransportError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::NOT_FOUND {
        // The Bot API answers 404 for a malformed token, 401 for a revoked one.
        return Err(TransportError::Unauthorized);
    }

    let envelope: ApiResponse<T> = serde_json::from_str(body).map_err(|e| {
        if status.is_success() {
            TransportError::Decode(e.to_string())
        } else {
            TransportError::Api {
                code: i64::from(status.as_u16()),
                description: body.chars().take(200).collect(),
            }
        }
    })?;

    match (envelope.ok, envelope.result) {
        (true, Some(result)) => Ok(result),
        (true, None) => Err(TransportError::Decode("response has no result".to_string())),
        (false, _) => Err(TransportError::Api {
            code: envelope
                .error_code
                .unwrap_or_else(|| i64::from(status.as_u16())),
            description: envelope.description.unwrap_or_default(),
        }),
    }
}
