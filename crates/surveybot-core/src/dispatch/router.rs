use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use surveybot_types::event::InboundEvent;
use surveybot_types::identity::ParticipantId;
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;
use tracing::{debug, trace};

/// How long a participant's worker waits for another event before exiting.
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Something that consumes inbound events one at a time per participant.
pub trait EventHandler: Send + Sync + 'static {
    fn handle(&self, event: InboundEvent) -> impl Future<Output = ()> + Send;
}

type Mailboxes = Arc<DashMap<ParticipantId, mpsc::UnboundedSender<InboundEvent>>>;

/// Routes events to per-participant FIFO mailboxes.
///
/// Events for one participant are handled strictly in arrival order, never
/// concurrently; different participants proceed in parallel. A worker that
/// sits idle for the idle timeout drops its mailbox and exits, and the next
/// event for that participant starts a fresh one.
pub struct IdentityRouter<H> {
    handler: Arc<H>,
    mailboxes: Mailboxes,
    tracker: TaskTracker,
    idle_timeout: Duration,
}

impl<H: EventHandler> IdentityRouter<H> {
    pub fn new(handler: Arc<H>) -> Self {
        Self {
            handler,
            mailboxes: Arc::new(DashMap::new()),
            tracker: TaskTracker::new(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Queue `event` behind any earlier events from the same participant.
    pub fn route(&self, event: InboundEvent) {
        let participant = event.participant;
        match self.mailboxes.entry(participant) {
            Entry::Occupied(mut occupied) => {
                if let Err(mpsc::error::SendError(event)) = occupied.get().send(event) {
                    // The worker exited between its idle check and now.
                    let tx = self.spawn_worker(participant);
                    let _ = tx.send(event);
                    occupied.insert(tx);
                }
            }
            Entry::Vacant(vacant) => {
                let tx = self.spawn_worker(participant);
                let _ = tx.send(event);
                vacant.insert(tx);
            }
        }
    }

    /// Number of participants with a live worker.
    pub fn active(&self) -> usize {
        self.mailboxes.len()
    }

    /// Stop accepting work and wait for queued events to drain.
    pub async fn shutdown(&self) {
        self.mailboxes.clear();
        self.tracker.close();
        self.tracker.wait().await;
        debug!("identity router drained");
    }

    fn spawn_worker(&self, participant: ParticipantId) -> mpsc::UnboundedSender<InboundEvent> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handler = Arc::clone(&self.handler);
        let mailboxes = Arc::clone(&self.mailboxes);
        let idle_timeout = self.idle_timeout;

        trace!(%participant, "starting participant worker");
        self.tracker.spawn(async move {
            loop {
                match tokio::time::timeout(idle_timeout, rx.recv()).await {
                    Ok(Some(event)) => handler.handle(event).await,
                    Ok(None) => break,
                    Err(_) => {
                        // Senders only push while holding the entry lock, so an
                        // empty queue checked under that lock stays empty.
                        if mailboxes
                            .remove_if(&participant, |_, _| rx.is_empty())
                            .is_some()
                        {
                            break;
                        }
                    }
                }
            }
            trace!(%participant, "participant worker exited");
        });
        tx
    }
}
