//! Persistence-facing projection of a session.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::answer::{Rating, Sex};
use crate::identity::ParticipantId;

/// Maximum number of columns written per row (sheet range `A:N`).
pub const MAX_COLUMNS: usize = 14;

/// Placeholder written for an unanswered demographic field.
pub const PLACEHOLDER: &str = "N/A";

/// A completed or partially completed survey, ready to be written as a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub identity: ParticipantId,
    pub age: Option<u32>,
    pub sex: Option<Sex>,
    pub answers: Vec<Rating>,
    pub elapsed: Duration,
}

impl Record {
    /// Flatten into positional columns.
    ///
    /// Layout: identity, age, sex, one cell per question (empty when
    /// unanswered, extra answers dropped), elapsed seconds. The result is
    /// capped at [`MAX_COLUMNS`]; the identity is always column one.
    pub fn to_columns(&self, question_count: usize) -> Vec<String> {
        let mut columns = Vec::with_capacity(question_count + 4);
        columns.push(self.identity.to_string());
        columns.push(
            self.age
                .map(|age| age.to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        );
        columns.push(
            self.sex
                .map(|sex| sex.to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        );
        columns.extend(
            (0..question_count).map(|i| {
                self.answers
                    .get(i)
                    .map(|rating| rating.to_string())
                    .unwrap_or_default()
            }),
        );
        columns.push(format!("{:.3}", self.elapsed.as_secs_f64()));
        columns.truncate(MAX_COLUMNS);
        columns
    }

    /// Sheet key of this record (the first column).
    pub fn key(&self) -> String {
        self.identity.to_string()
    }
}

/// Convert a 1-based column count into its spreadsheet letter (`14` -> `N`).
pub fn column_letter(mut index: usize) -> String {
    let mut letters = Vec::new();
    while index > 0 {
        let rem = (index - 1) % 26;
        letters.push(b'A' + rem as u8);
        index = (index - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratings(values: &[u8]) -> Vec<Rating> {
        values.iter().map(|v| Rating::new(*v).unwrap()).collect()
    }

    #[test]
    fn test_complete_record_fills_fourteen_columns() {
        let record = Record {
            identity: ParticipantId(99),
            age: Some(23),
            sex: Some(Sex::Female),
            answers: ratings(&[5, 4, 3, 2, 1, 5, 4, 3, 2, 1]),
            elapsed: Duration::from_millis(42_500),
        };
        let columns = record.to_columns(10);
        assert_eq!(columns.len(), MAX_COLUMNS);
        assert_eq!(columns[0], "99");
        assert_eq!(columns[1], "23");
        assert_eq!(columns[2], "female");
        assert_eq!(columns[3], "5");
        assert_eq!(columns[12], "1");
        assert_eq!(columns[13], "42.500");
    }

    #[test]
    fn test_partial_record_pads_with_placeholders_and_blanks() {
        let record = Record {
            identity: ParticipantId(7),
            age: None,
            sex: None,
            answers: Vec::new(),
            elapsed: Duration::from_secs(181),
        };
        let columns = record.to_columns(3);
        assert_eq!(columns, vec!["7", "N/A", "N/A", "", "", "", "181.000"]);
    }

    #[test]
    fn test_long_survey_is_capped() {
        let record = Record {
            identity: ParticipantId(1),
            age: Some(40),
            sex: Some(Sex::Male),
            answers: ratings(&[1; 12]),
            elapsed: Duration::from_secs(10),
        };
        let columns = record.to_columns(12);
        assert_eq!(columns.len(), MAX_COLUMNS);
        // Elapsed time falls off the end, as with any over-wide row.
        assert_eq!(columns[13], "1");
    }

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(14), "N");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
    }
}
