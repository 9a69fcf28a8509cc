//! End-to-end sync of one player's ledger.
//!
//! A sync runs in this order:
//!
//! 1. flush updates an earlier run left in the report outbox
//! 2. export the local ledger
//! 3. reconcile with the remote snapshot (open, merge, commit)
//! 4. persist the reconciled ledger
//! 5. aggregate the reconciled records
//! 6. flush the report outbox
//!
//! Each step persists its own result before the next one starts. Stopping at
//! any point loses nothing: the next run picks up uncounted records through
//! `SyncState.counted` and undelivered updates through the outbox, and
//! merging again is a no-op.
//!
//! Records only count once they went through step 3, so a word found offline
//! on two devices is scored by whichever device sees the other's copy first.
//! Syncs and resumes through clones of one [`ProgressHandle`] take turns.

use std::sync::Arc;

use super::resolver::ConflictResolver;
use super::store::SnapshotStore;
use crate::aggregate::AggregationReport;
use crate::api::{ProgressHandle, ProgressReporter, Result};
use crate::config::ProgressConfig;
use crate::repository::{Guess, PuzzleHistoryEntry};
use crate::types::{VersionToken, current_timestamp_ms};

/// Summary of a completed sync.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Aggregation of the freshly reconciled ledger.
    pub report: AggregationReport,
    /// Snapshot version the ledger now matches.
    pub version: VersionToken,
    pub conflicts: u32,
    /// The remote blob was unreadable and treated as empty.
    pub remote_decode_failed: bool,
    /// Records in the ledger after reconciliation.
    pub records: usize,
    /// Counter updates delivered to the reporter during this run.
    pub delivered: usize,
}

/// Drives reconciliation and reporting for one player.
///
/// Collaborators are passed in explicitly; nothing here is process-global.
pub struct SyncCoordinator {
    store: Arc<dyn SnapshotStore>,
    reporter: Arc<dyn ProgressReporter>,
    resolver: ConflictResolver,
    snapshot_name: String,
}

impl SyncCoordinator {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        reporter: Arc<dyn ProgressReporter>,
        config: &ProgressConfig,
    ) -> Self {
        Self {
            store,
            reporter,
            resolver: ConflictResolver::new(config.max_conflict_attempts),
            snapshot_name: config.snapshot_name.clone(),
        }
    }

    pub fn snapshot_name(&self) -> &str {
        &self.snapshot_name
    }

    /// Reconcile the local ledger with the remote snapshot and report new
    /// progress.
    pub async fn sync(
        &self,
        handle: &ProgressHandle,
        history: &[PuzzleHistoryEntry],
    ) -> Result<SyncOutcome> {
        let _guard = handle.lock_sync().await;

        let mut delivered = self.flush(handle).await?;

        let local: Vec<Guess> = handle
            .export()
            .await?
            .into_iter()
            .map(|record| record.guess)
            .collect();

        tracing::info!(
            "Syncing {} local guesses with snapshot {}",
            local.len(),
            self.snapshot_name
        );

        let reconciled = self
            .resolver
            .reconcile(
                self.store.as_ref(),
                &self.snapshot_name,
                &local,
                current_timestamp_ms(),
            )
            .await?;

        let records = handle
            .apply_reconciliation(reconciled.guesses, reconciled.version.clone())
            .await?;

        let report = handle.aggregate(history.to_vec()).await?;
        delivered += self.flush(handle).await?;

        tracing::info!(
            "Sync complete at version {}: {} records, +{} points, {} updates delivered",
            reconciled.version,
            records.len(),
            report.points_delta,
            delivered
        );

        Ok(SyncOutcome {
            report,
            version: reconciled.version,
            conflicts: reconciled.conflicts,
            remote_decode_failed: reconciled.remote_decode_failed,
            records: records.len(),
            delivered,
        })
    }

    /// Finish work an interrupted sync left behind, without touching the
    /// remote snapshot. Records that were never reconciled stay uncounted.
    pub async fn resume(
        &self,
        handle: &ProgressHandle,
        history: &[PuzzleHistoryEntry],
    ) -> Result<AggregationReport> {
        let _guard = handle.lock_sync().await;

        let report = handle.aggregate(history.to_vec()).await?;
        if report.processed > 0 {
            tracing::info!(
                "Resumed aggregation of {} uncounted guesses",
                report.processed
            );
        }
        self.flush(handle).await?;
        Ok(report)
    }

    /// Deliver the report outbox and acknowledge what was accepted.
    async fn flush(&self, handle: &ProgressHandle) -> Result<usize> {
        let pending = handle.sync_state().await?.pending_report;
        let Some(last) = pending.last() else {
            return Ok(0);
        };
        let through_seq = last.seq;

        let updates: Vec<_> = pending.iter().map(|entry| entry.update).collect();
        self.reporter.report(&updates).await?;
        handle.acknowledge_report(through_seq).await?;

        tracing::debug!(
            "Delivered {} counter updates through seq {}",
            updates.len(),
            through_seq
        );
        Ok(updates.len())
    }
}
