use surveybot_types::error::SessionError;
use surveybot_types::event::{Choice, OutboundMessage};
use surveybot_types::record::Record;
use surveybot_types::session::Session;

/// What the state machine reacts to. `/help` never reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    Start,
    Text(&'a str),
    Choice(Choice),
}

/// A side effect for the dispatcher to carry out, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Send(OutboundMessage),
    Persist(Record),
    /// Tell the participant their session is gone.
    NotifyExpired,
}

/// How the stored session changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    Replace(Session),
    Keep,
    Remove,
}

/// The outcome of one transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub next: Next,
    pub effects: Vec<Effect>,
    /// Why the input was not accepted, if it wasn't.
    pub rejected: Option<SessionError>,
}

impl Step {
    pub(crate) fn advance(session: Session, effects: Vec<Effect>) -> Self {
        Self {
            next: Next::Replace(session),
            effects,
            rejected: None,
        }
    }

    pub(crate) fn reject(reason: SessionError, reprompt: OutboundMessage) -> Self {
        Self {
            next: Next::Keep,
            effects: vec![Effect::Send(reprompt)],
            rejected: Some(reason),
        }
    }

    pub(crate) fn expire(next: Next, reason: SessionError) -> Self {
        Self {
            next,
            effects: vec![Effect::NotifyExpired],
            rejected: Some(reason),
        }
    }
}
