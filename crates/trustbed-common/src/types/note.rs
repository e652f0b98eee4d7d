//! Note - the three-valued rating a reporter gives a subject
//!
//! Notes double as the classifier label and as the realized outcome tier of a
//! simulated transaction:
//! - `Positive` (1): both demanded thresholds met
//! - `Neutral` (0): exactly one threshold met
//! - `Negative` (-1): neither threshold met, or a bad-mouthed report

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// A rating in {-1, 0, 1}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
#[repr(i8)]
pub enum Note {
    Negative = -1,
    Neutral = 0,
    Positive = 1,
}

impl Note {
    /// Every note, in ascending order
    pub const ALL: [Note; 3] = [Note::Negative, Note::Neutral, Note::Positive];

    /// Integer value of the note
    #[inline]
    pub fn value(self) -> i8 {
        self as i8
    }

    /// Pick one of the two other notes uniformly at random
    pub fn wrong_note<R: Rng + ?Sized>(self, rng: &mut R) -> Note {
        let others: Vec<Note> = Self::ALL.into_iter().filter(|n| *n != self).collect();
        others[rng.gen_range(0..others.len())]
    }
}

impl From<Note> for i8 {
    fn from(note: Note) -> Self {
        note.value()
    }
}

impl TryFrom<i8> for Note {
    type Error = DataError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(value))
    }
}

impl TryFrom<i64> for Note {
    type Error = DataError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Note::Negative),
            0 => Ok(Note::Neutral),
            1 => Ok(Note::Positive),
            other => Err(DataError::InvalidNote(other)),
        }
    }
}

impl std::fmt::Display for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_note_values() {
        assert_eq!(Note::Negative.value(), -1);
        assert_eq!(Note::Neutral.value(), 0);
        assert_eq!(Note::Positive.value(), 1);
    }

    #[test]
    fn test_invalid_note_rejected() {
        assert_eq!(Note::try_from(2i8), Err(DataError::InvalidNote(2)));
        assert_eq!(Note::try_from(-5i64), Err(DataError::InvalidNote(-5)));
    }

    #[test]
    fn test_note_serde_as_integer() {
        let json = serde_json::to_string(&Note::Negative).unwrap();
        assert_eq!(json, "-1");
        let note: Note = serde_json::from_str("1").unwrap();
        assert_eq!(note, Note::Positive);
        assert!(serde_json::from_str::<Note>("3").is_err());
    }

    #[test]
    fn test_wrong_note_covers_both_alternatives() {
        let mut rng = StdRng::seed_from_u64(11);
        let seen: std::collections::HashSet<Note> =
            (0..200).map(|_| Note::Neutral.wrong_note(&mut rng)).collect();
        assert_eq!(seen.len(), 2);
        assert!(!seen.contains(&Note::Neutral));
    }

    proptest! {
        #[test]
        fn prop_wrong_note_differs(seed in any::<u64>(), idx in 0usize..3) {
            let mut rng = StdRng::seed_from_u64(seed);
            let note = Note::ALL[idx];
            let wrong = note.wrong_note(&mut rng);
            prop_assert_ne!(wrong, note);
            prop_assert!(Note::ALL.contains(&wrong));
        }
    }
}
