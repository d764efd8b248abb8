//! Core tuning engine module
//!
//! Contains the engine that applies a tuning plan and the counters it
//! reports at the end of a pass.

mod engine;
mod stats;

pub use engine::TuningEngine;
pub use stats::{StatsSnapshot, StatsTracker};
