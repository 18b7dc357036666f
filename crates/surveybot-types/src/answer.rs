//! Demographic choices and the fixed rating scale.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Self-reported sex, one of three mutually exclusive choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    Other,
}

impl Sex {
    pub const ALL: [Sex; 3] = [Sex::Male, Sex::Female, Sex::Other];

    /// Wire value carried by the selection button and written to the sheet.
    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Other => "other",
        }
    }

    /// Button caption shown to the participant.
    pub fn label(self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
            Sex::Other => "Other",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            "other" => Ok(Sex::Other),
            other => Err(format!("invalid sex choice: '{other}'")),
        }
    }
}

/// A single answer on the fixed 1..=5 scale.
///
/// Construction goes through [`Rating::new`] so an out-of-range value can
/// never reach a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Rating(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// All ratings in keyboard order, highest first.
    pub fn descending() -> impl Iterator<Item = Rating> {
        (Self::MIN..=Self::MAX).rev().map(Rating)
    }

    /// Meaning of this point on the scale, as explained in the help text.
    pub fn label(self) -> &'static str {
        match self.0 {
            5 => "Extremely or always true",
            4 => "Highly or usually true",
            3 => "Moderately or sometimes true",
            2 => "Slightly or seldom true",
            _ => "Not at all or never true",
        }
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new(value).ok_or_else(|| format!("rating out of range: {value}"))
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u8 = s
            .parse()
            .map_err(|_| format!("invalid rating: '{s}'"))?;
        Rating::try_from(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sex_roundtrip() {
        for sex in Sex::ALL {
            let parsed: Sex = sex.to_string().parse().unwrap();
            assert_eq!(sex, parsed);
        }
        assert!("Male".parse::<Sex>().is_err());
    }

    #[test]
    fn test_rating_bounds() {
        assert!(Rating::new(0).is_none());
        assert!(Rating::new(6).is_none());
        assert_eq!(Rating::new(3).unwrap().value(), 3);
        assert!("7".parse::<Rating>().is_err());
        assert!("x".parse::<Rating>().is_err());
    }

    #[test]
    fn test_rating_descending_order() {
        let values: Vec<u8> = Rating::descending().map(Rating::value).collect();
        assert_eq!(values, vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_rating_serde_rejects_out_of_range() {
        assert!(serde_json::from_str::<Rating>("9").is_err());
        let rating: Rating = serde_json::from_str("2").unwrap();
        assert_eq!(rating.value(), 2);
    }
}
