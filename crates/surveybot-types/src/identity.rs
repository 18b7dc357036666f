//! Participant identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Stable key identifying a participant across events.
///
/// Assigned by the chat platform (a Telegram user id). Doubles as the
/// destination for outbound messages in private chats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub i64);

impl ParticipantId {
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ParticipantId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(ParticipantId)
            .map_err(|_| format!("invalid participant id: '{s}'"))
    }
}

impl From<i64> for ParticipantId {
    fn from(value: i64) -> Self {
        ParticipantId(value)
    }
}
