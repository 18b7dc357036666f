//! Per-participant survey session.
//!
//! A `Session` exists from the participant's `/start` until the survey is
//! completed or the session expires. Its `stage` is stored explicitly rather
//! than inferred from which optional fields happen to be populated.

use std::fmt;
use std::time::{Duration, Instant};

use crate::answer::{Rating, Sex};
use crate::identity::ParticipantId;
use crate::record::Record;

/// Position of a session in the fixed survey sequence.
///
/// Completion is not a stored stage: a session that answers its last
/// question is removed in the same step that emits its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    AwaitingAge,
    AwaitingSex,
    /// Waiting for the rating of the question at this zero-based index.
    AskingQuestion(usize),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::AwaitingAge => write!(f, "awaiting_age"),
            Stage::AwaitingSex => write!(f, "awaiting_sex"),
            Stage::AskingQuestion(index) => write!(f, "asking_question_{index}"),
        }
    }
}

/// In-memory survey state for one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: ParticipantId,
    pub stage: Stage,
    pub age: Option<u32>,
    pub sex: Option<Sex>,
    /// Accepted ratings in question order. Append-only.
    pub answers: Vec<Rating>,
    /// Monotonic creation time; the basis for expiry.
    pub started_at: Instant,
}

impl Session {
    /// A fresh session waiting for the participant's age.
    pub fn new(identity: ParticipantId, started_at: Instant) -> Self {
        Self {
            identity,
            stage: Stage::AwaitingAge,
            age: None,
            sex: None,
            answers: Vec::new(),
            started_at,
        }
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    /// Whether the session has outlived the survey window.
    ///
    /// This is the single expiry predicate: the lazy check on event arrival
    /// and the periodic sweep both call it, so they can never disagree.
    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        self.elapsed(now) > ttl
    }

    /// Whether `stage` agrees with the populated fields.
    pub fn is_consistent(&self, question_count: usize) -> bool {
        let answered = self.answers.len();
        match self.stage {
            Stage::AwaitingAge => self.age.is_none() && self.sex.is_none() && answered == 0,
            Stage::AwaitingSex => self.age.is_some() && self.sex.is_none() && answered == 0,
            Stage::AskingQuestion(index) => {
                self.age.is_some()
                    && self.sex.is_some()
                    && answered == index
                    && index < question_count
            }
        }
    }

    /// Project this session into a persistable record.
    pub fn to_record(&self, now: Instant) -> Record {
        Record {
            identity: self.identity,
            age: self.age,
            sex: self.sex,
            answers: self.answers.clone(),
            elapsed: self.elapsed(now),
        }
    }
}
