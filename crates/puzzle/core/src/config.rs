/// Rule constants for the daily word puzzle.
///
/// These are fixed by the puzzle format: changing any of them changes the
/// score of already-recorded guesses, so they are not runtime-tunable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PuzzleConfig;

impl PuzzleConfig {
    /// Shortest accepted word, in characters.
    pub const MIN_WORD_LEN: usize = 3;
    /// Number of outer letters (the center letter is held separately).
    pub const LETTER_COUNT: usize = 6;
    /// Number of levels a day's point range is divided into.
    pub const LEVEL_COUNT: u32 = 7;
    /// Flat bonus added to a perfect word's score.
    pub const PERFECT_BONUS: u32 = 10;
}
