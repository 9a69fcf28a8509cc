//! Shared types for the repository layer.

mod counter;
mod guess;
mod history;
mod sync_state;

pub use counter::{Counter, CounterKind, CounterUpdate, PendingUpdate};
pub use guess::{Guess, GuessRecord};
pub use history::PuzzleHistoryEntry;
pub use sync_state::SyncState;
