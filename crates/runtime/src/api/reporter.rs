//! Boundary with leaderboard and achievement services.
//!
//! Reporters only ever receive non-negative updates. [`CounterKind::Increment`]
//! updates are added to a running total; [`CounterKind::Maximum`] updates
//! raise a stored best and are idempotent. The remote service owns the stored
//! values and maps [`Counter`]s to its own identifiers.
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use crate::repository::{Counter, CounterKind, CounterUpdate};

#[derive(Debug, Clone, Error)]
#[error("progress report failed: {message}")]
pub struct ReportError {
    pub message: String,
    pub retryable: bool,
}

impl ReportError {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }
}

#[async_trait]
pub trait ProgressReporter: Send + Sync {
    /// Deliver `updates` in order. Either all are accepted or the call fails
    /// and the same updates are offered again later.
    async fn report(&self, updates: &[CounterUpdate]) -> Result<(), ReportError>;
}

/// Reporter that keeps every update in memory.
#[derive(Debug, Default)]
pub struct InMemoryReporter {
    received: Mutex<Vec<CounterUpdate>>,
    failing: Mutex<bool>,
}

impl InMemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent reports fail until reset.
    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut flag) = self.failing.lock() {
            *flag = failing;
        }
    }

    /// Every update delivered so far.
    pub fn received(&self) -> Vec<CounterUpdate> {
        self.received
            .lock()
            .map(|received| received.clone())
            .unwrap_or_default()
    }

    /// Stored value of `counter`: the sum of its updates, or the largest one
    /// for maximum counters.
    pub fn value(&self, counter: Counter) -> u64 {
        let values = self
            .received()
            .into_iter()
            .filter(|update| update.counter == counter)
            .map(|update| update.value);

        match counter.kind() {
            CounterKind::Increment => values.sum(),
            CounterKind::Maximum => values.max().unwrap_or(0),
        }
    }
}

#[async_trait]
impl ProgressReporter for InMemoryReporter {
    async fn report(&self, updates: &[CounterUpdate]) -> Result<(), ReportError> {
        if self.failing.lock().map(|flag| *flag).unwrap_or(true) {
            return Err(ReportError::retryable("reporter unavailable"));
        }

        let mut received = self
            .received
            .lock()
            .map_err(|_| ReportError::retryable("reporter lock poisoned"))?;
        received.extend_from_slice(updates);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn maximum_counters_keep_the_best_value() {
        let reporter = InMemoryReporter::new();
        reporter
            .report(&[
                CounterUpdate::new(Counter::Points, 3),
                CounterUpdate::new(Counter::PlayedStreak, 2),
            ])
            .await
            .unwrap();
        reporter
            .report(&[
                CounterUpdate::new(Counter::Points, 4),
                CounterUpdate::new(Counter::PlayedStreak, 2),
                CounterUpdate::new(Counter::PlayedStreak, 1),
            ])
            .await
            .unwrap();

        assert_eq!(reporter.value(Counter::Points), 7);
        assert_eq!(reporter.value(Counter::PlayedStreak), 2);
        assert_eq!(reporter.value(Counter::PerfectStreak), 0);
    }
}
