//! Common type aliases used throughout the runtime.
//!
//! These type aliases provide semantic clarity for primitive types
//! that are used with specific meanings across the runtime.

/// Locally unique, monotonically increasing guess identifier.
///
/// Ids are scoped to one device and never leave it.
pub type GuessId = u64;

/// Player identifier (one ledger per player)
pub type PlayerId = String;

/// Unix timestamp in milliseconds
pub type TimestampMs = i64;

/// Byte offset in a file
pub type ByteOffset = u64;

/// Ledger generation; bumped on every `replace_all`
pub type Generation = u64;

/// Opaque version token issued by the snapshot service.
pub type VersionToken = String;

/// Current wall-clock time in epoch milliseconds.
pub fn current_timestamp_ms() -> TimestampMs {
    chrono::Utc::now().timestamp_millis()
}
