//! Long-poll loop feeding inbound events to the router.

use std::sync::Arc;
use std::time::Duration;

use surveybot_types::error::TransportError;
use surveybot_types::event::InboundEvent;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::client::TelegramClient;
use super::mapping::to_event;
use super::types::Update;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Tracks the `getUpdates` offset so every update is delivered once.
pub struct UpdatePoller {
    client: Arc<TelegramClient>,
    offset: Option<i64>,
}

impl UpdatePoller {
    pub fn new(client: Arc<TelegramClient>) -> Self {
        Self {
            client,
            offset: None,
        }
    }

    /// Fetch the next batch of updates and confirm them.
    pub async fn next_batch(&mut self) -> Result<Vec<InboundEvent>, TransportError> {
        let updates = self.client.get_updates(self.offset).await?;
        self.offset = next_offset(self.offset, &updates);
        Ok(updates.into_iter().filter_map(to_event).collect())
    }

    /// Poll until `cancel` fires, handing each event to `deliver` in
    /// arrival order.
    ///
    /// An unauthorized token ends the loop with an error; any other failure
    /// is retried with exponential backoff.
    pub async fn run<F>(mut self, deliver: F, cancel: CancellationToken) -> Result<(), TransportError>
    where
        F: Fn(InboundEvent),
    {
        info!("polling for updates");
        let mut backoff = INITIAL_BACKOFF;

        loop {
            let batch = tokio::select! {
                _ = cancel.cancelled() => break,
                batch = self.next_batch() => batch,
            };

            match batch {
                Ok(events) => {
                    backoff = INITIAL_BACKOFF;
                    if !events.is_empty() {
                        debug!(count = events.len(), "received updates");
                    }
                    events.into_iter().for_each(&deliver);
                }
                Err(TransportError::Unauthorized) => return Err(TransportError::Unauthorized),
                Err(err) => {
                    warn!(error = %err, retry_in_secs = backoff.as_secs(), "getUpdates failed");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
        }

        info!("update polling stopped");
        Ok(())
    }
}

fn next_offset(current: Option<i64>, updates: &[Update]) -> Option<i64> {
    updates
        .iter()
        .map(|u| u.update_id + 1)
        .max()
        .max(current)
}
