//! Periodic expiry sweep.
//!
//! Every tick the sweeper evicts the sessions that have outlived the survey
//! window and tells each participant, best-effort, that their session is
//! gone. It runs independently of event traffic and shares only the session
//! store with the dispatcher; a participant whose session it evicts simply
//! gets the expiry reply on their next event.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use surveybot_types::session::{Session, Stage};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::clock::{Clock, ticker};
use crate::persist::{AppendSink, RecordPersister, TabularBackend};
use crate::prompts;
use crate::store::SessionStore;
use crate::transport::ChatTransport;

/// What one sweep did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub evicted: usize,
    pub notified: usize,
    pub persisted: usize,
}

pub struct ExpirySweeper<T, B, S> {
    store: Arc<SessionStore>,
    transport: Arc<T>,
    persister: Arc<RecordPersister<B, S>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    interval: Duration,
    persist_partial: bool,
}

impl<T, B, S> ExpirySweeper<T, B, S>
where
    T: ChatTransport,
    B: TabularBackend,
    S: AppendSink,
{
    pub fn new(
        store: Arc<SessionStore>,
        transport: Arc<T>,
        persister: Arc<RecordPersister<B, S>>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            transport,
            persister,
            clock,
            ttl,
            interval,
            persist_partial: false,
        }
    }

    /// Upsert what expired sessions collected, once they got past the age
    /// question.
    pub fn with_partial_persistence(mut self, enabled: bool) -> Self {
        self.persist_partial = enabled;
        self
    }

    /// Evict expired sessions and notify their participants.
    pub async fn sweep_once(&self) -> SweepReport {
        let now = self.clock.now();
        let evicted = self.store.evict_expired(now, self.ttl);
        if evicted.is_empty() {
            return SweepReport::default();
        }

        let mut report = SweepReport {
            evicted: evicted.len(),
            ..SweepReport::default()
        };

        if self.persist_partial {
            for session in evicted.iter().filter(|s| has_partial_answers(s)) {
                match self.persister.upsert(&session.to_record(now)).await {
                    Ok(outcome) => {
                        report.persisted += 1;
                        debug!(participant = %session.identity, %outcome, "partial record saved");
                    }
                    Err(err) => {
                        error!(participant = %session.identity, error = %err, "failed to save partial record");
                    }
                }
            }
        }

        let notice = prompts::expired_notice();
        let results = join_all(evicted.iter().map(|session| {
            let notice = &notice;
            async move { (session.identity, self.transport.send(session.identity, notice).await) }
        }))
        .await;

        for (participant, result) in results {
            match result {
                Ok(()) => report.notified += 1,
                Err(err) => debug!(%participant, error = %err, "expiry notice not delivered"),
            }
        }

        report
    }

    /// Sweep on every tick until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        let mut tick = ticker(self.interval);
        info!(interval_secs = self.interval.as_secs(), ttl_secs = self.ttl.as_secs(), "expiry sweeper started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tick.tick() => {
                    let report = self.sweep_once().await;
                    if report.evicted > 0 {
                        info!(
                            evicted = report.evicted,
                            notified = report.notified,
                            persisted = report.persisted,
                            "expired sessions swept"
                        );
                    }
                }
            }
        }

        info!("expiry sweeper stopped");
    }
}

fn has_partial_answers(session: &Session) -> bool {
    session.stage != Stage::AwaitingAge
}
