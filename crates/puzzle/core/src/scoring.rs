//! The scoring rule.
//!
//! Live validation and historical aggregation both score through
//! [`score_word`]; nothing else in the workspace computes points.

use crate::config::PuzzleConfig;

/// Points awarded for a correct word.
///
/// | length | points |
/// |---|---|
/// | < 3 | 0 |
/// | 3 | 1 |
/// | 4 | 2 |
/// | ≥ 5 | length |
///
/// Perfect words earn [`PuzzleConfig::PERFECT_BONUS`] on top.
pub fn score_word(word: &str, perfect: bool) -> u32 {
    let len = word.chars().count();
    let base = match len {
        0..=2 => 0,
        3 => 1,
        4 => 2,
        n => u32::try_from(n).unwrap_or(u32::MAX),
    };
    if perfect {
        base.saturating_add(PuzzleConfig::PERFECT_BONUS)
    } else {
        base
    }
}
