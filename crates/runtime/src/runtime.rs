//! High-level runtime orchestrator.
//!
//! The runtime owns the ledger worker, wires up its command channel, and
//! exposes a builder-based API for clients to record guesses and sync.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::{ProgressError, ProgressHandle, ProgressReporter, Result};
use crate::config::ProgressConfig;
use crate::repository::{FileLedger, ProgressLedger};
use crate::sync::{SnapshotStore, SyncCoordinator};
use crate::workers::{Command, LedgerWorker};

/// Runtime for one player's progress.
///
/// [`ProgressHandle`] provides a cloneable façade for clients.
pub struct ProgressRuntime {
    config: ProgressConfig,
    handle: ProgressHandle,
    worker_handle: JoinHandle<()>,
}

impl ProgressRuntime {
    /// Create a new runtime builder
    pub fn builder() -> ProgressRuntimeBuilder {
        ProgressRuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> ProgressHandle {
        self.handle.clone()
    }

    pub fn config(&self) -> &ProgressConfig {
        &self.config
    }

    /// Build a sync coordinator for this player's snapshot.
    pub fn coordinator(
        &self,
        store: Arc<dyn SnapshotStore>,
        reporter: Arc<dyn ProgressReporter>,
    ) -> SyncCoordinator {
        SyncCoordinator::new(store, reporter, &self.config)
    }

    /// Shutdown the runtime gracefully.
    ///
    /// The worker drains queued commands and stops once every outstanding
    /// handle clone is dropped.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);

        self.worker_handle
            .await
            .map_err(ProgressError::WorkerJoin)?;

        Ok(())
    }
}

/// Builder for [`ProgressRuntime`].
pub struct ProgressRuntimeBuilder {
    config: ProgressConfig,
    ledger: Option<Box<dyn ProgressLedger>>,
}

impl ProgressRuntimeBuilder {
    fn new() -> Self {
        Self {
            config: ProgressConfig::default(),
            ledger: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: ProgressConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a specific ledger instead of the file ledger under
    /// [`ProgressConfig::ledger_dir`].
    pub fn ledger(mut self, ledger: impl ProgressLedger + 'static) -> Self {
        self.ledger = Some(Box::new(ledger));
        self
    }

    /// Build the runtime and spawn its worker.
    pub async fn build(self) -> Result<ProgressRuntime> {
        let ledger: Box<dyn ProgressLedger> = match self.ledger {
            Some(ledger) => ledger,
            None => Box::new(FileLedger::open(self.config.ledger_dir())?),
        };

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer);
        let handle = ProgressHandle::new(command_tx);

        let worker = LedgerWorker::new(ledger, command_rx);
        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });

        tracing::info!(
            "Progress runtime started for player {}",
            self.config.player_id
        );

        Ok(ProgressRuntime {
            config: self.config,
            handle,
            worker_handle,
        })
    }
}
