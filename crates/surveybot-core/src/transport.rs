//! Outbound side of the chat transport.
//!
//! The inbound side is just a stream of `InboundEvent`s handed to the
//! dispatcher; only sending needs a port.

use surveybot_types::error::TransportError;
use surveybot_types::event::OutboundMessage;
use surveybot_types::identity::ParticipantId;

/// Delivers messages to participants.
///
/// Implementations live in surveybot-infra (e.g., `TelegramClient`).
pub trait ChatTransport: Send + Sync {
    /// Send `message` (with its choice keyboard, if any) to `to`.
    fn send(
        &self,
        to: ParticipantId,
        message: &OutboundMessage,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;

    /// Acknowledge a button press, separately from any reply text.
    fn acknowledge(
        &self,
        callback_id: &str,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;
}
