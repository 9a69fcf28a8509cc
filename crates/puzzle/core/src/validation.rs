//! Word validation.
//!
//! Checks run in a fixed priority order and the first failing check decides
//! the verdict:
//!
//! 1. too short
//! 2. center letter missing
//! 3. not in dictionary
//! 4. already found
//!
//! A two-letter entry is always `TooShort`, whatever else is wrong with it.

use std::collections::BTreeSet;

use crate::config::PuzzleConfig;
use crate::definition::PuzzleDefinition;
use crate::error::{ErrorSeverity, PuzzleError};

/// Outcome of validating a single submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::IntoStaticStr, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Verdict {
    TooShort,
    CenterLetterMissing,
    NotInDictionary,
    AlreadyFound,
    Correct,
}

impl Verdict {
    pub fn is_correct(self) -> bool {
        matches!(self, Verdict::Correct)
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Converts a rejection into a [`ValidationError`] for callers that
    /// propagate with `?`.
    pub fn into_result(self, def: &PuzzleDefinition) -> Result<(), ValidationError> {
        match self {
            Verdict::Correct => Ok(()),
            Verdict::TooShort => Err(ValidationError::TooShort {
                min: PuzzleConfig::MIN_WORD_LEN,
            }),
            Verdict::CenterLetterMissing => Err(ValidationError::CenterLetterMissing {
                center: def.center(),
            }),
            Verdict::NotInDictionary => Err(ValidationError::NotInDictionary),
            Verdict::AlreadyFound => Err(ValidationError::AlreadyFound),
        }
    }
}

/// A rejected submission. Never retried; surfaced to the player as-is.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("word must have at least {min} letters")]
    TooShort { min: usize },

    #[error("word must contain the center letter {center:?}")]
    CenterLetterMissing { center: char },

    #[error("word is not in today's list")]
    NotInDictionary,

    #[error("word was already found")]
    AlreadyFound,
}

impl PuzzleError for ValidationError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            ValidationError::TooShort { .. } => Verdict::TooShort.as_str(),
            ValidationError::CenterLetterMissing { .. } => Verdict::CenterLetterMissing.as_str(),
            ValidationError::NotInDictionary => Verdict::NotInDictionary.as_str(),
            ValidationError::AlreadyFound => Verdict::AlreadyFound.as_str(),
        }
    }
}

/// Validates `word` against `def`.
///
/// `already_found` holds the lowercase words the player has found for this
/// puzzle; the caller owns it.
pub fn validate(def: &PuzzleDefinition, word: &str, already_found: &BTreeSet<String>) -> Verdict {
    let normalized = word.trim().to_lowercase();

    if normalized.chars().count() < PuzzleConfig::MIN_WORD_LEN {
        return Verdict::TooShort;
    }

    let center: String = def.center().to_lowercase().collect();
    if !normalized.contains(center.as_str()) {
        return Verdict::CenterLetterMissing;
    }

    if !def.words().contains_key(&normalized) {
        return Verdict::NotInDictionary;
    }

    if already_found.contains(&normalized) {
        return Verdict::AlreadyFound;
    }

    Verdict::Correct
}
