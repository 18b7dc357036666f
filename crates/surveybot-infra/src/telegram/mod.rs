//! Telegram Bot API transport.
//!
//! `TelegramClient` implements [`ChatTransport`](surveybot_core::transport::ChatTransport)
//! over the HTTPS Bot API; `UpdatePoller` long-polls `getUpdates` and turns
//! each update into an [`InboundEvent`](surveybot_types::event::InboundEvent).

pub mod client;
pub mod mapping;
pub mod poller;
pub mod types;

pub use client::TelegramClient;
pub use poller::UpdatePoller;
