//! Snapshot service boundary.
//!
//! The remote side is an opaque key-blob store with optimistic versioning.
//! Transport retries live behind this trait; callers only see the final
//! [`NetworkError`] when the service gives up.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::error::NetworkError;
use crate::types::{TimestampMs, VersionToken};

/// Descriptive fields stored next to a snapshot blob.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SnapshotMetadata {
    pub description: String,
    pub last_modified_ms: TimestampMs,
    pub guess_count: usize,
}

/// A snapshot as read from the service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteSnapshot {
    pub bytes: Vec<u8>,
    pub version: VersionToken,
    pub metadata: SnapshotMetadata,
}

/// Two divergent versions of the same snapshot.
///
/// The conflict is resolved by committing against `conflict_version`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotConflict {
    pub conflict_version: VersionToken,
    pub local: RemoteSnapshot,
    pub remote: RemoteSnapshot,
}

#[derive(Clone, Debug)]
pub enum OpenOutcome {
    Opened(RemoteSnapshot),
    Conflict(SnapshotConflict),
}

#[derive(Clone, Debug)]
pub enum CommitOutcome {
    Committed(VersionToken),
    Conflict(SnapshotConflict),
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Open the named snapshot. A missing snapshot is created empty when
    /// `create_if_missing` is set, and is an error otherwise.
    async fn open(&self, name: &str, create_if_missing: bool)
    -> Result<OpenOutcome, NetworkError>;

    /// Write `bytes` if the stored version still matches `version`.
    async fn commit(
        &self,
        name: &str,
        bytes: Vec<u8>,
        version: &VersionToken,
        metadata: SnapshotMetadata,
    ) -> Result<CommitOutcome, NetworkError>;
}

#[derive(Clone, Debug)]
struct StoredSnapshot {
    bytes: Vec<u8>,
    version: u64,
    metadata: SnapshotMetadata,
}

impl StoredSnapshot {
    fn to_remote(&self) -> RemoteSnapshot {
        RemoteSnapshot {
            bytes: self.bytes.clone(),
            version: self.version.to_string(),
            metadata: self.metadata.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    current: Option<StoredSnapshot>,
    previous: Option<StoredSnapshot>,
    forced_conflicts: u32,
}

#[derive(Debug, Default)]
struct StoreState {
    slots: HashMap<String, Slot>,
    next_version: u64,
    offline: bool,
}

impl StoreState {
    fn bump_version(&mut self) -> u64 {
        self.next_version += 1;
        self.next_version
    }
}

/// In-memory snapshot store.
///
/// Versions are increasing integers rendered as strings. Tests can make the
/// next N open/commit calls report a conflict with [`force_conflicts`], write
/// as another device with [`put`], or take the store offline.
///
/// [`force_conflicts`]: InMemorySnapshotStore::force_conflicts
/// [`put`]: InMemorySnapshotStore::put
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    state: Mutex<StoreState>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` open or commit calls on `name` report a conflict.
    pub fn force_conflicts(&self, name: &str, count: u32) {
        if let Ok(mut state) = self.state.lock() {
            state.slots.entry(name.to_string()).or_default().forced_conflicts = count;
        }
    }

    /// Overwrite the snapshot unconditionally, as another device would.
    pub fn put(&self, name: &str, bytes: Vec<u8>, metadata: SnapshotMetadata) -> VersionToken {
        let Ok(mut state) = self.state.lock() else {
            return String::new();
        };
        let version = state.bump_version();
        let slot = state.slots.entry(name.to_string()).or_default();
        slot.previous = slot.current.take();
        slot.current = Some(StoredSnapshot {
            bytes,
            version,
            metadata,
        });
        version.to_string()
    }

    /// Current contents of `name`, if any.
    pub fn get(&self, name: &str) -> Option<RemoteSnapshot> {
        let state = self.state.lock().ok()?;
        state
            .slots
            .get(name)
            .and_then(|slot| slot.current.as_ref())
            .map(StoredSnapshot::to_remote)
    }

    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.offline = offline;
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoreState>, NetworkError> {
        let state = self
            .state
            .lock()
            .map_err(|_| NetworkError::fatal("snapshot store lock poisoned"))?;
        if state.offline {
            return Err(NetworkError::retryable("snapshot service unreachable"));
        }
        Ok(state)
    }
}

fn conflict_of(local: RemoteSnapshot, current: &StoredSnapshot) -> SnapshotConflict {
    SnapshotConflict {
        conflict_version: current.version.to_string(),
        local,
        remote: current.to_remote(),
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn open(
        &self,
        name: &str,
        create_if_missing: bool,
    ) -> Result<OpenOutcome, NetworkError> {
        let mut state = self.lock()?;

        if !state.slots.get(name).is_some_and(|slot| slot.current.is_some()) {
            if !create_if_missing {
                return Err(NetworkError::fatal(format!("snapshot {name} not found")));
            }
            let version = state.bump_version();
            let slot = state.slots.entry(name.to_string()).or_default();
            slot.current = Some(StoredSnapshot {
                bytes: Vec::new(),
                version,
                metadata: SnapshotMetadata::default(),
            });
            tracing::debug!("Created snapshot {} at version {}", name, version);
        }

        let Some(slot) = state.slots.get_mut(name) else {
            return Err(NetworkError::fatal(format!("snapshot {name} not found")));
        };
        let Some(current) = slot.current.clone() else {
            return Err(NetworkError::fatal(format!("snapshot {name} not found")));
        };

        if slot.forced_conflicts > 0 {
            slot.forced_conflicts -= 1;
            let local = slot
                .previous
                .as_ref()
                .map(StoredSnapshot::to_remote)
                .unwrap_or_else(|| current.to_remote());
            tracing::debug!("Reporting conflict on open of {}", name);
            return Ok(OpenOutcome::Conflict(conflict_of(local, &current)));
        }

        Ok(OpenOutcome::Opened(current.to_remote()))
    }

    async fn commit(
        &self,
        name: &str,
        bytes: Vec<u8>,
        version: &VersionToken,
        metadata: SnapshotMetadata,
    ) -> Result<CommitOutcome, NetworkError> {
        let mut state = self.lock()?;
        let next_version = state.next_version + 1;

        let Some(slot) = state.slots.get_mut(name) else {
            return Err(NetworkError::fatal(format!("snapshot {name} not found")));
        };
        let Some(current) = slot.current.clone() else {
            return Err(NetworkError::fatal(format!("snapshot {name} not found")));
        };

        let attempted = RemoteSnapshot {
            bytes: bytes.clone(),
            version: version.clone(),
            metadata: metadata.clone(),
        };

        if slot.forced_conflicts > 0 {
            slot.forced_conflicts -= 1;
            tracing::debug!("Reporting forced conflict on commit of {}", name);
            return Ok(CommitOutcome::Conflict(conflict_of(attempted, &current)));
        }

        if *version != current.version.to_string() {
            tracing::debug!(
                "Commit of {} against stale version {} (current {})",
                name,
                version,
                current.version
            );
            return Ok(CommitOutcome::Conflict(conflict_of(attempted, &current)));
        }

        slot.previous = slot.current.take();
        slot.current = Some(StoredSnapshot {
            bytes,
            version: next_version,
            metadata,
        });
        state.next_version = next_version;

        Ok(CommitOutcome::Committed(next_version.to_string()))
    }
}
