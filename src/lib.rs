//! # TaskOpt - One-Shot Scheduler Tuning for System Tasks
//!
//! TaskOpt makes a single pass over a live process tree, finds processes and
//! threads by command name, and steers them with scheduling hints: CPU
//! affinity, niceness, SCHED_FIFO priority and I/O priority class.
//! Latency-sensitive services go to performance cores; background
//! maintenance goes to efficiency cores with an idle I/O class.
//!
//! ## Features
//!
//! - **Pattern-based discovery**: regular expressions over `/proc/<pid>/comm`
//! - **big.LITTLE awareness**: cores classified by cpufreq max frequency
//! - **Bounded retries**: every syscall retried within a fixed budget
//! - **Honest accounting**: one success or failure per thread, never both
//! - **Dry run**: scan and log without touching the scheduler
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskopt::config::{TunerConfig, TuningPlan};
//! use taskopt::core::{StatsTracker, TuningEngine};
//! use taskopt::system::KernelSched;
//!
//! let config = TunerConfig::default();
//! let stats = Arc::new(StatsTracker::new());
//! let engine = TuningEngine::from_config(&config, KernelSched, stats);
//!
//! let summary = engine.run(&TuningPlan::default());
//! println!("{}", summary);
//! ```
//!
//! ## Custom Plans
//!
//! ```no_run
//! use taskopt::config::{Tier, TierKind, TuningOperation, TuningPlan};
//!
//! let plan = TuningPlan::new(vec![Tier::uniform(
//!     TierKind::HighPriority,
//!     &["surfaceflinger", "^composer"],
//!     TuningOperation::high_priority(),
//!     "high_prio",
//! )]);
//! assert_eq!(plan.task_count(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod process;
pub mod system;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::{TunerConfig, TuningPlan};
pub use core::{StatsSnapshot, StatsTracker, TuningEngine};
pub use error::{Result, TuneError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use taskopt::prelude::*;
    //! ```

    pub use crate::config::{TaskSpec, Tier, TierKind, TunerConfig, TuningOperation, TuningPlan, TuningStep};
    pub use crate::core::{StatsSnapshot, StatsTracker, TuningEngine};
    pub use crate::error::{Result, TuneError};
    pub use crate::process::ProcessScanner;
    pub use crate::system::{
        CoreClass, CoreSet, CpuTopology, DryRunSched, IoClass, KernelSched, RetryPolicy, Sanitizer,
        SchedControl, SyscallApplier, Tid,
    };
}
