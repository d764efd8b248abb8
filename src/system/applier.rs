//! Validated, retrying application of scheduling attributes
//!
//! Every call checks that the target still exists, then hands off to a
//! [`SchedControl`]. The `try_*` methods make a single attempt and return the
//! error; the plain methods retry within a fixed budget and return whether
//! the setting was achieved.

use super::{CoreSet, IoClass, Sanitizer, SchedControl, Tid};
use crate::error::{Result, TuneError};
use std::time::Duration;

/// Attempts per operation
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Pause between attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Bounded retry budget shared by all four operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first, at least 1
    pub max_attempts: u32,
    /// Sleep between attempts, never after the last one
    pub delay: Duration,
}

impl RetryPolicy {
    /// Build a policy; `max_attempts` is clamped to at least one
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Worst-case time spent sleeping for a single operation
    pub fn max_blocking(&self) -> Duration {
        self.delay * self.max_attempts.saturating_sub(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

/// Applies scheduling attributes to threads
pub struct SyscallApplier<S> {
    sched: S,
    sanitizer: Sanitizer,
    retry: RetryPolicy,
}

impl<S: SchedControl> SyscallApplier<S> {
    /// Create an applier with the default retry policy
    pub fn new(sched: S, sanitizer: Sanitizer) -> Self {
        Self {
            sched,
            sanitizer,
            retry: RetryPolicy::default(),
        }
    }

    /// Use a different retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Active retry policy
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Underlying control
    pub fn sched(&self) -> &S {
        &self.sched
    }

    fn ensure_live(&self, tid: Tid) -> Result<()> {
        if self.sanitizer.is_valid_pid(tid) {
            Ok(())
        } else {
            Err(TuneError::InvalidTarget(tid))
        }
    }

    /// Single attempt at restricting `tid` to `cores`
    pub fn try_set_affinity(&self, tid: Tid, cores: &CoreSet) -> Result<()> {
        self.ensure_live(tid)?;
        self.sched.set_affinity(tid, cores)
    }

    /// Single attempt at setting the niceness of `tid`
    pub fn try_set_niceness(&self, tid: Tid, value: i32) -> Result<()> {
        self.ensure_live(tid)?;
        self.sched.set_niceness(tid, value)
    }

    /// Single attempt at moving `tid` to SCHED_FIFO
    pub fn try_set_realtime(&self, tid: Tid, priority: i32) -> Result<()> {
        self.ensure_live(tid)?;
        self.sched.set_realtime(tid, priority)
    }

    /// Single attempt at setting the I/O class of `tid`
    pub fn try_set_io_class(&self, tid: Tid, class: IoClass) -> Result<()> {
        self.ensure_live(tid)?;
        self.sched.set_io_class(tid, class)
    }

    /// Restrict `tid` to `cores`, retrying within budget
    pub fn set_affinity(&self, tid: Tid, cores: &CoreSet) -> bool {
        self.retrying("affinity", tid, || self.try_set_affinity(tid, cores))
    }

    /// Set the niceness of `tid`, retrying within budget
    pub fn set_niceness(&self, tid: Tid, value: i32) -> bool {
        self.retrying("nice", tid, || self.try_set_niceness(tid, value))
    }

    /// Move `tid` to SCHED_FIFO at `priority`, retrying within budget
    pub fn set_realtime(&self, tid: Tid, priority: i32) -> bool {
        self.retrying("realtime", tid, || self.try_set_realtime(tid, priority))
    }

    /// Set the I/O class of `tid`, retrying within budget
    pub fn set_io_class(&self, tid: Tid, class: IoClass) -> bool {
        self.retrying("ioprio", tid, || self.try_set_io_class(tid, class))
    }

    fn retrying(&self, op: &str, tid: Tid, attempt: impl Fn() -> Result<()>) -> bool {
        let max_attempts = self.retry.max_attempts.max(1);

        for n in 1..=max_attempts {
            match attempt() {
                Ok(()) => return true,
                Err(e) => {
                    tracing::debug!("{} attempt {}/{} for TID {}: {}", op, n, max_attempts, tid, e);
                    if n < max_attempts {
                        std::thread::sleep(self.retry.delay);
                    }
                }
            }
        }

        false
    }
}
