//! Public runtime API surface.
//!
//! This module gathers the types exposed to consumers of the runtime crate so
//! other layers can stay focused on orchestration, workers, or infrastructure.

pub mod errors;
pub mod handle;
pub mod reporter;

pub use errors::{ProgressError, Result};
pub use handle::ProgressHandle;
pub use reporter::{InMemoryReporter, ProgressReporter, ReportError};
