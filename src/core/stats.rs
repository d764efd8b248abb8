//! Operation counters
//!
//! Shared across worker threads; increments only.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Attempted, succeeded and failed thread operations
#[derive(Debug, Default)]
pub struct StatsTracker {
    attempted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Operations attempted
    pub attempted: u64,
    /// Operations that fully succeeded
    pub succeeded: u64,
    /// Operations that failed within the retry budget
    pub failed: u64,
}

impl StatsSnapshot {
    /// True if nothing failed
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

impl std::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Operations: {} | Success: {} | Failed: {}",
            self.attempted, self.succeeded, self.failed
        )
    }
}

impl StatsTracker {
    /// Zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a successful operation
    pub fn record_success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
        self.attempted.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a failed operation
    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.attempted.fetch_add(1, Ordering::Relaxed);
    }

    /// Current values
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            attempted: self.attempted.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    /// Log the totals
    pub fn report(&self) {
        tracing::info!("{}", self.snapshot());
    }
}
