//! Inbound transport events and outbound messages.
//!
//! Inbound events are a tagged variant so the state machine can match on
//! them exhaustively instead of comparing raw payload strings. Outbound
//! messages carry an optional choice keyboard whose button data comes back
//! as a [`EventKind::Callback`].

use serde::{Deserialize, Serialize};

use crate::answer::{Rating, Sex};
use crate::identity::ParticipantId;

/// An event received from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub participant: ParticipantId,
    pub kind: EventKind,
}

impl InboundEvent {
    pub fn new(participant: ParticipantId, kind: EventKind) -> Self {
        Self { participant, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// `/start`: begin (or restart) the survey.
    Start,
    /// `/help`: static information, never touches session state.
    Help,
    /// Free text typed by the participant.
    Text(String),
    /// A keyboard button press. `callback_id` must be acknowledged.
    Callback { callback_id: String, data: String },
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::Help => "help",
            EventKind::Text(_) => "text",
            EventKind::Callback { .. } => "callback",
        }
    }
}

/// Decoded button payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Sex(Sex),
    Rating(Rating),
    Unknown,
}

impl Choice {
    pub fn parse(data: &str) -> Self {
        if let Ok(sex) = data.parse::<Sex>() {
            return Choice::Sex(sex);
        }
        match data.parse::<Rating>() {
            Ok(rating) => Choice::Rating(rating),
            Err(_) => Choice::Unknown,
        }
    }
}

/// How the transport should render message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextFormat {
    #[default]
    Plain,
    Markdown,
}

/// A single selectable button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// A set of mutually exclusive choices rendered as inline buttons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// Male / Female / Other on one row.
    pub fn sex() -> Self {
        Self {
            rows: vec![
                Sex::ALL
                    .iter()
                    .map(|sex| Button::new(sex.label(), sex.as_str()))
                    .collect(),
            ],
        }
    }

    /// Ratings 5 through 1 on one row.
    pub fn rating() -> Self {
        Self {
            rows: vec![
                Rating::descending()
                    .map(|rating| Button::new(rating.to_string(), rating.to_string()))
                    .collect(),
            ],
        }
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

/// A message to deliver to one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub text: String,
    pub keyboard: Option<Keyboard>,
    pub format: TextFormat,
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
            format: TextFormat::Plain,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    pub fn markdown(mut self) -> Self {
        self.format = TextFormat::Markdown;
        self
    }
}
