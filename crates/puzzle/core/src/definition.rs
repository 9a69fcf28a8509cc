//! Puzzle definitions and their content-addressed fingerprints.
//!
//! A [`PuzzleDefinition`] is an immutable value handed to the core by the
//! external puzzle fetcher. Everything derived from it (fingerprint, point
//! totals, perfect words) is computed once in [`PuzzleDefinition::new`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use sha2::{Digest, Sha256};

use crate::config::PuzzleConfig;
use crate::error::{ErrorSeverity, PuzzleError};
use crate::letters::LetterSet;
use crate::scoring::score_word;

/// Content hash identifying a puzzle independent of value ordering.
///
/// Guesses reference their puzzle by fingerprint only, so this is the join
/// key between the ledger and puzzle history.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wraps an already-computed fingerprint (e.g. read back from storage).
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines.
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }

    /// Computes the fingerprint of a puzzle's content.
    ///
    /// Input is normalized before hashing: letters and word keys are
    /// lowercased and sorted, and all text is hashed as UTF-8, so neither
    /// iteration order nor platform encoding affects the result.
    pub fn compute<'a>(
        letters: impl IntoIterator<Item = char>,
        center: char,
        words: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let mut sorted_letters: Vec<char> =
            letters.into_iter().flat_map(char::to_lowercase).collect();
        sorted_letters.sort_unstable();

        let mut pairs: Vec<(String, &str)> = words
            .into_iter()
            .map(|(word, definition)| (word.to_lowercase(), definition))
            .collect();
        pairs.sort_unstable();

        let mut hasher = Sha256::new();
        hasher.update(b"letters=");
        hasher.update(sorted_letters.iter().collect::<String>().as_bytes());
        hasher.update(b"\ncenter=");
        hasher.update(center.to_lowercase().collect::<String>().as_bytes());
        hasher.update(b"\nwords=");
        for (word, definition) in &pairs {
            hasher.update(b"\n");
            hasher.update(word.as_bytes());
            hasher.update(b":");
            hasher.update(definition.as_bytes());
        }

        Self(hex::encode(hasher.finalize()))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Fingerprint {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Errors raised when a fetched puzzle does not describe a playable puzzle.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    #[error("expected {expected} letters, got {actual}")]
    LetterCount { expected: usize, actual: usize },

    #[error("letter {0:?} is not alphabetic")]
    NonAlphabetic(char),

    #[error("outer letter {0:?} appears more than once")]
    DuplicateLetter(char),

    #[error("center letter {0:?} also appears among the outer letters")]
    CenterRepeated(char),

    #[error("word {0:?} appears more than once")]
    DuplicateWord(String),

    #[error("puzzle has no words")]
    EmptyDictionary,
}

impl PuzzleError for DefinitionError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        use DefinitionError::*;
        match self {
            LetterCount { .. } => "DEFINITION_LETTER_COUNT",
            NonAlphabetic(_) => "DEFINITION_NON_ALPHABETIC",
            DuplicateLetter(_) => "DEFINITION_DUPLICATE_LETTER",
            CenterRepeated(_) => "DEFINITION_CENTER_REPEATED",
            DuplicateWord(_) => "DEFINITION_DUPLICATE_WORD",
            EmptyDictionary => "DEFINITION_EMPTY_DICTIONARY",
        }
    }
}

/// A single day's puzzle.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "RawDefinition", into = "RawDefinition")
)]
pub struct PuzzleDefinition {
    letters: Vec<char>,
    center: char,
    /// Lowercase word → original/defining form.
    words: BTreeMap<String, String>,

    // ===== derived once at construction =====
    fingerprint: Fingerprint,
    letter_set: LetterSet,
    max_points: u32,
    points_per_level: u32,
    perfect_words: BTreeSet<String>,
}

impl PuzzleDefinition {
    pub fn new<W, D>(
        letters: impl IntoIterator<Item = char>,
        center: char,
        words: impl IntoIterator<Item = (W, D)>,
    ) -> Result<Self, DefinitionError>
    where
        W: AsRef<str>,
        D: Into<String>,
    {
        let letters: Vec<char> = letters.into_iter().collect();
        if letters.len() != PuzzleConfig::LETTER_COUNT {
            return Err(DefinitionError::LetterCount {
                expected: PuzzleConfig::LETTER_COUNT,
                actual: letters.len(),
            });
        }
        if let Some(&bad) = letters
            .iter()
            .chain(std::iter::once(&center))
            .find(|c| !c.is_alphabetic())
        {
            return Err(DefinitionError::NonAlphabetic(bad));
        }

        let mut seen = BTreeSet::new();
        if let Some(&repeated) = letters
            .iter()
            .find(|c| !c.to_lowercase().all(|lower| seen.insert(lower)))
        {
            return Err(DefinitionError::DuplicateLetter(repeated));
        }

        let letter_set = LetterSet::new(letters.iter().copied());
        if letter_set.contains(center) {
            return Err(DefinitionError::CenterRepeated(center));
        }

        let mut map = BTreeMap::new();
        for (word, definition) in words {
            let key = word.as_ref().trim().to_lowercase();
            if map.insert(key.clone(), definition.into()).is_some() {
                return Err(DefinitionError::DuplicateWord(key));
            }
        }
        if map.is_empty() {
            return Err(DefinitionError::EmptyDictionary);
        }

        let fingerprint = Fingerprint::compute(
            letters.iter().copied(),
            center,
            map.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        );

        let perfect_words: BTreeSet<String> = map
            .keys()
            .filter(|word| letter_set.is_perfect(word))
            .cloned()
            .collect();

        let max_points = map
            .keys()
            .map(|word| score_word(word, perfect_words.contains(word)))
            .fold(0u32, u32::saturating_add);

        Ok(Self {
            letters,
            center,
            words: map,
            fingerprint,
            letter_set,
            max_points,
            points_per_level: max_points / PuzzleConfig::LEVEL_COUNT,
            perfect_words,
        })
    }

    pub fn letters(&self) -> &[char] {
        &self.letters
    }

    pub fn center(&self) -> char {
        self.center
    }

    pub fn words(&self) -> &BTreeMap<String, String> {
        &self.words
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn letter_set(&self) -> &LetterSet {
        &self.letter_set
    }

    pub fn max_points(&self) -> u32 {
        self.max_points
    }

    pub fn points_per_level(&self) -> u32 {
        self.points_per_level
    }

    pub fn perfect_words(&self) -> &BTreeSet<String> {
        &self.perfect_words
    }

    pub fn perfect_word_count(&self) -> usize {
        self.perfect_words.len()
    }

    /// Looks up the defining form of a dictionary word (case-insensitive).
    pub fn definition_of(&self, word: &str) -> Option<&str> {
        self.words.get(&word.trim().to_lowercase()).map(String::as_str)
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.definition_of(word).is_some()
    }

    pub fn is_perfect_word(&self, word: &str) -> bool {
        self.letter_set.is_perfect(word)
    }

    pub fn score(&self, word: &str) -> u32 {
        score_word(word, self.is_perfect_word(word))
    }

    /// Level reached with `points` on this puzzle, from 0 up to
    /// [`PuzzleConfig::LEVEL_COUNT`].
    pub fn level_for(&self, points: u32) -> u32 {
        if points >= self.max_points {
            return PuzzleConfig::LEVEL_COUNT;
        }
        if self.points_per_level == 0 {
            return 0;
        }
        (points / self.points_per_level).min(PuzzleConfig::LEVEL_COUNT)
    }
}

/// Wire form of a definition: only the source fields, derived data is rebuilt.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawDefinition {
    letters: Vec<char>,
    center: char,
    words: BTreeMap<String, String>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawDefinition> for PuzzleDefinition {
    type Error = DefinitionError;

    fn try_from(raw: RawDefinition) -> Result<Self, Self::Error> {
        PuzzleDefinition::new(raw.letters, raw.center, raw.words)
    }
}

#[cfg(feature = "serde")]
impl From<PuzzleDefinition> for RawDefinition {
    fn from(def: PuzzleDefinition) -> Self {
        Self {
            letters: def.letters,
            center: def.center,
            words: def.words,
        }
    }
}
