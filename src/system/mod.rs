//! Host-facing building blocks
//!
//! Input sanitizing, CPU topology detection, the scheduling control
//! interface and the retrying applier built on top of it.

mod applier;
pub mod sanitize;
pub mod sched;
pub mod topology;

pub use applier::*;
pub use sanitize::{is_valid_pattern, parse_id, sanitize_digits, Sanitizer};
pub use sched::{DryRunSched, IoClass, KernelSched, SchedControl};
pub use topology::{CoreClass, CoreLayout, CoreSet, CpuTopology};

/// Kernel process or thread ID
pub type Tid = i32;
