//! Normalized letter sets and the perfect-word rule.

use std::collections::BTreeSet;

/// The distinct outer letters of a puzzle, lowercased.
///
/// This is the only place the perfect-word ("tuti") rule is implemented:
/// a word is perfect when it contains every letter of the set at least
/// once. Repeated letters and letters outside the set are allowed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct LetterSet(BTreeSet<char>);

impl LetterSet {
    pub fn new(letters: impl IntoIterator<Item = char>) -> Self {
        Self(letters.into_iter().flat_map(char::to_lowercase).collect())
    }

    /// Returns true if `word` contains every letter in the set (case-insensitive).
    pub fn is_perfect(&self, word: &str) -> bool {
        if self.0.is_empty() {
            return false;
        }
        let present: BTreeSet<char> = word.chars().flat_map(char::to_lowercase).collect();
        self.0.is_subset(&present)
    }

    pub fn contains(&self, letter: char) -> bool {
        letter.to_lowercase().all(|c| self.0.contains(&c))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<char> for LetterSet {
    fn from_iter<I: IntoIterator<Item = char>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letters() -> LetterSet {
        LetterSet::new("ABCDEF".chars())
    }

    #[test]
    fn perfect_word_needs_every_letter() {
        assert!(letters().is_perfect("fabced"));
        assert!(!letters().is_perfect("faced"));
    }

    #[test]
    fn perfect_word_allows_repeats_and_extra_letters() {
        assert!(letters().is_perfect("bedface-cab"));
        assert!(letters().is_perfect("ABCDEFXYZ"));
    }

    #[test]
    fn empty_set_has_no_perfect_words() {
        assert!(!LetterSet::default().is_perfect("anything"));
    }

    #[test]
    fn letters_are_deduplicated_and_lowercased() {
        let set = LetterSet::new("AaBb".chars());
        assert_eq!(set.len(), 2);
        assert!(set.contains('A'));
        assert!(set.contains('b'));
    }
}
