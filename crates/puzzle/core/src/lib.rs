//! Deterministic word-puzzle rules shared across clients.
//!
//! `puzzle-core` defines the canonical puzzle value ([`PuzzleDefinition`]),
//! its content-addressed [`Fingerprint`], the single scoring rule and the
//! word validation order. Everything here is pure: the runtime crate and
//! offline tools call into these functions and own all state themselves.
pub mod config;
pub mod definition;
pub mod error;
pub mod letters;
pub mod scoring;
pub mod validation;

pub use config::PuzzleConfig;
pub use definition::{DefinitionError, Fingerprint, PuzzleDefinition};
pub use error::{ErrorSeverity, PuzzleError};
pub use letters::LetterSet;
pub use scoring::score_word;
pub use validation::{ValidationError, Verdict, validate};
