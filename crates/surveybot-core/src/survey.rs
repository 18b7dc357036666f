//! Immutable survey definition.
//!
//! Loaded once at startup and shared read-only by every session. The
//! built-in definition is the ten-statement test anxiety questionnaire; a
//! replacement list can be supplied as TOML:
//!
//! ```toml
//! questions = ["First statement", "Second statement"]
//! ```

use serde::Deserialize;
use surveybot_types::error::SurveyError;
use surveybot_types::event::{Keyboard, OutboundMessage};
use surveybot_types::record::MAX_COLUMNS;

/// Columns a record spends on things other than answers: identity, age,
/// sex, and elapsed time.
const NON_ANSWER_COLUMNS: usize = 4;

const BUILTIN_QUESTIONS: [&str; 10] = [
    "The closer I am to a major exam, the harder it is for me to concentrate on the material.",
    "When I study, I worry that I will not remember the material on the exam.",
    "During important exams, I think that I am doing awful or that I may fail.",
    "I lose focus on important exams, and I cannot remember material that I knew before the exam.",
    "I finally remember the answer to exam questions after the exam is already over.",
    "I worry so much before a major exam that I am too worn out to do my best on the exam.",
    "I feel out of sorts or not really myself when I take important exams.",
    "I find that my mind sometimes wanders when I am taking important exams.",
    "After an exam, I worry about whether I did well enough.",
    "I struggle with writing assignments, or avoid them as long as I can. I feel that whatever I do will not be good enough.",
];

/// One statement rated on the fixed 1..=5 scale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub text: String,
}

/// Ordered, non-empty list of questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Survey {
    questions: Vec<Question>,
}

#[derive(Deserialize)]
struct SurveyFile {
    questions: Vec<String>,
}

impl Survey {
    pub fn new<I, S>(questions: I) -> Result<Self, SurveyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let questions: Vec<Question> = questions
            .into_iter()
            .map(|text| Question { text: text.into() })
            .filter(|q| !q.text.trim().is_empty())
            .collect();

        if questions.is_empty() {
            return Err(SurveyError::Empty);
        }

        Ok(Self { questions })
    }

    pub fn builtin() -> Self {
        Self {
            questions: BUILTIN_QUESTIONS
                .iter()
                .map(|text| Question {
                    text: (*text).to_string(),
                })
                .collect(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SurveyError> {
        let file: SurveyFile =
            toml::from_str(content).map_err(|e| SurveyError::Load(e.to_string()))?;
        Self::new(file.questions)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// `Q{n}: {text}` with the rating keyboard, or `None` past the end.
    pub fn prompt(&self, index: usize) -> Option<OutboundMessage> {
        let question = self.question(index)?;
        Some(
            OutboundMessage::text(format!("Q{}: {}", index + 1, question.text))
                .with_keyboard(Keyboard::rating()),
        )
    }

    /// Whether every answer plus the elapsed time fits in one sheet row.
    pub fn fits_row(&self) -> bool {
        self.len() + NON_ANSWER_COLUMNS <= MAX_COLUMNS
    }
}

impl Default for Survey {
    fn default() -> Self {
        Self::builtin()
    }
}
