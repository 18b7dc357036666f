use std::sync::Arc;
use std::time::Duration;

use surveybot_types::error::PersistError;
use surveybot_types::event::{Choice, EventKind, InboundEvent, OutboundMessage};
use surveybot_types::identity::ParticipantId;
use tracing::{debug, error, info, warn};

use super::router::EventHandler;
use crate::clock::Clock;
use crate::machine::{Effect, Input, MachineContext, Next, transition};
use crate::persist::{AppendSink, RecordPersister, TabularBackend};
use crate::prompts;
use crate::store::SessionStore;
use crate::survey::Survey;
use crate::transport::ChatTransport;

/// Runs inbound events through the state machine and carries out the
/// resulting effects.
///
/// Expects at most one in-flight `handle` call per participant; use
/// [`IdentityRouter`](super::IdentityRouter) to guarantee it.
pub struct Dispatcher<T, B, S> {
    store: Arc<SessionStore>,
    survey: Arc<Survey>,
    transport: Arc<T>,
    persister: Arc<RecordPersister<B, S>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl<T, B, S> Dispatcher<T, B, S>
where
    T: ChatTransport,
    B: TabularBackend,
    S: AppendSink,
{
    pub fn new(
        store: Arc<SessionStore>,
        survey: Arc<Survey>,
        transport: Arc<T>,
        persister: Arc<RecordPersister<B, S>>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            survey,
            transport,
            persister,
            clock,
            ttl,
        }
    }

    pub async fn dispatch(&self, event: InboundEvent) {
        let participant = event.participant;
        debug!(%participant, kind = event.kind.name(), "event received");

        match event.kind {
            EventKind::Help => self.deliver(participant, &prompts::help()).await,
            EventKind::Start => self.advance(participant, Input::Start).await,
            EventKind::Text(text) => self.advance(participant, Input::Text(&text)).await,
            EventKind::Callback { callback_id, data } => {
                if let Err(err) = self.transport.acknowledge(&callback_id).await {
                    warn!(%participant, error = %err, "failed to acknowledge callback");
                }
                self.advance(participant, Input::Choice(Choice::parse(&data)))
                    .await;
            }
        }
    }

    async fn advance(&self, participant: ParticipantId, input: Input<'_>) {
        let ctx = MachineContext {
            survey: &self.survey,
            ttl: self.ttl,
        };
        let now = self.clock.now();
        let step = self
            .store
            .apply(participant, |current| transition(&ctx, participant, current, input, now));

        match (&step.next, &step.rejected) {
            (_, Some(reason)) => debug!(%participant, %reason, "input not accepted"),
            (Next::Replace(session), None) => {
                debug!(%participant, stage = %session.stage, "session advanced")
            }
            (Next::Remove, None) => info!(%participant, "survey completed"),
            (Next::Keep, None) => {}
        }

        for effect in step.effects {
            if let Err(err) = self.execute(participant, effect).await {
                // Nothing after a lost record may claim it was saved.
                error!(%participant, error = %err, "survey record lost");
                self.deliver(participant, &prompts::save_failed()).await;
                break;
            }
        }
    }

    async fn execute(&self, participant: ParticipantId, effect: Effect) -> Result<(), PersistError> {
        match effect {
            Effect::Send(message) => self.deliver(participant, &message).await,
            Effect::NotifyExpired => self.deliver(participant, &prompts::expired_notice()).await,
            Effect::Persist(record) => {
                let outcome = self.persister.upsert(&record).await?;
                info!(%participant, %outcome, "survey record saved");
            }
        }
        Ok(())
    }

    async fn deliver(&self, participant: ParticipantId, message: &OutboundMessage) {
        if let Err(err) = self.transport.send(participant, message).await {
            warn!(%participant, error = %err, "failed to send message");
        }
    }
}

impl<T, B, S> EventHandler for Dispatcher<T, B, S>
where
    T: ChatTransport + 'static,
    B: TabularBackend + 'static,
    S: AppendSink + 'static,
{
    async fn handle(&self, event: InboundEvent) {
        self.dispatch(event).await
    }
}
