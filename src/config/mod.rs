//! Configuration module for TaskOpt
//!
//! Provides CLI arguments, runtime settings and the tuning plan.

mod plan;
mod settings;

pub use plan::*;
pub use settings::*;
