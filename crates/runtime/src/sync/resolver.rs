//! Reconciliation of local and remote ledgers.
//!
//! Snapshots are sets of guess tuples, so merging is plain set union. That
//! makes it commutative, associative and idempotent: re-merging an already
//! merged ledger never changes it, and a conflict can be resolved by merging
//! both sides and committing again.

use std::collections::BTreeSet;

use super::codec::{SNAPSHOT_FORMAT_VERSION, SnapshotCodec};
use super::error::{DecodeError, SyncError};
use super::store::{
    CommitOutcome, OpenOutcome, RemoteSnapshot, SnapshotConflict, SnapshotMetadata, SnapshotStore,
};
use crate::repository::Guess;
use crate::types::{TimestampMs, VersionToken};

const SNAPSHOT_DESCRIPTION: &str = "Word puzzle progress";

/// Set union of two ledgers in canonical order.
pub fn merge(a: &[Guess], b: &[Guess]) -> Vec<Guess> {
    a.iter()
        .chain(b)
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Result of a successful reconciliation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reconciled {
    /// Union of local and remote guesses, canonically ordered.
    pub guesses: Vec<Guess>,
    /// Version token of the committed snapshot.
    pub version: VersionToken,
    /// Some remote blob could not be decoded and was treated as empty.
    pub remote_decode_failed: bool,
    /// Number of conflicts resolved on the way.
    pub conflicts: u32,
}

/// Snapshot content carried between attempts.
struct Working {
    guesses: Vec<Guess>,
    version: VersionToken,
    description: String,
}

/// Drives open → merge → commit against a [`SnapshotStore`] until a commit
/// lands or the conflict ceiling is hit.
#[derive(Clone, Copy, Debug)]
pub struct ConflictResolver {
    max_attempts: u32,
}

impl Default for ConflictResolver {
    fn default() -> Self {
        Self::new(10)
    }
}

impl ConflictResolver {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Reconcile `local` with the remote snapshot `name`.
    ///
    /// Network errors propagate untouched. A remote blob that fails to
    /// decode counts as an empty remote so local guesses are still written,
    /// unless it carries a newer format version; then nothing is committed.
    pub async fn reconcile(
        &self,
        store: &dyn SnapshotStore,
        name: &str,
        local: &[Guess],
        now: TimestampMs,
    ) -> Result<Reconciled, SyncError> {
        let mut decode_failed = false;
        let mut conflicts = 0u32;

        let mut outcome = match store.open(name, true).await? {
            OpenOutcome::Opened(snapshot) => Ok(snapshot),
            OpenOutcome::Conflict(conflict) => Err(conflict),
        };

        loop {
            let working = match outcome {
                Ok(snapshot) => Working {
                    guesses: decode_or_empty(&snapshot.bytes, &mut decode_failed)?,
                    version: snapshot.version,
                    description: snapshot.metadata.description,
                },
                Err(conflict) => {
                    conflicts += 1;
                    if conflicts > self.max_attempts {
                        tracing::error!(
                            "Snapshot {} still conflicting after {} attempts",
                            name,
                            self.max_attempts
                        );
                        return Err(SyncError::ConflictExhausted {
                            attempts: self.max_attempts,
                        });
                    }
                    tracing::info!(
                        "Resolving conflict {} on snapshot {} at version {}",
                        conflicts,
                        name,
                        conflict.conflict_version
                    );
                    collapse(conflict, &mut decode_failed)?
                }
            };

            let guesses = merge(&working.guesses, local);
            let bytes = SnapshotCodec::encode(&guesses).map_err(SyncError::Encode)?;
            let metadata = SnapshotMetadata {
                description: if working.description.is_empty() {
                    SNAPSHOT_DESCRIPTION.to_string()
                } else {
                    working.description
                },
                last_modified_ms: now,
                guess_count: guesses.len(),
            };

            match store.commit(name, bytes, &working.version, metadata).await? {
                CommitOutcome::Committed(version) => {
                    tracing::info!(
                        "Committed snapshot {} at version {} with {} guesses",
                        name,
                        version,
                        guesses.len()
                    );
                    return Ok(Reconciled {
                        guesses,
                        version,
                        remote_decode_failed: decode_failed,
                        conflicts,
                    });
                }
                CommitOutcome::Conflict(conflict) => outcome = Err(conflict),
            }
        }
    }
}

/// Collapse both sides of a conflict into one snapshot at the conflict
/// version. Content is the union; descriptive metadata comes from the most
/// recently modified side, the remote one on a tie.
fn collapse(conflict: SnapshotConflict, decode_failed: &mut bool) -> Result<Working, SyncError> {
    let SnapshotConflict {
        conflict_version,
        local,
        remote,
    } = conflict;

    let local_guesses = decode_or_empty(&local.bytes, decode_failed)?;
    let remote_guesses = decode_or_empty(&remote.bytes, decode_failed)?;
    let winner = newest(local, remote);

    Ok(Working {
        guesses: merge(&remote_guesses, &local_guesses),
        version: conflict_version,
        description: winner.metadata.description,
    })
}

fn newest(local: RemoteSnapshot, remote: RemoteSnapshot) -> RemoteSnapshot {
    if local.metadata.last_modified_ms > remote.metadata.last_modified_ms {
        local
    } else {
        remote
    }
}

fn decode_or_empty(bytes: &[u8], decode_failed: &mut bool) -> Result<Vec<Guess>, SyncError> {
    match SnapshotCodec::decode(bytes) {
        Ok(guesses) => Ok(guesses),
        Err(DecodeError::UnsupportedVersion(version)) if version > SNAPSHOT_FORMAT_VERSION => {
            tracing::error!(
                "Snapshot uses format version {}, newer than {}; not overwriting",
                version,
                SNAPSHOT_FORMAT_VERSION
            );
            Err(SyncError::NewerSnapshotFormat { version })
        }
        Err(error) => {
            tracing::warn!("Treating undecodable snapshot as empty: {}", error);
            *decode_failed = true;
            Ok(Vec::new())
        }
    }
}
