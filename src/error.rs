//! Error types for TaskOpt
//!
//! This module defines all error types used throughout the tuner. Only
//! [`TuneError::Setup`] is fatal; everything else is logged, tallied and
//! skipped by the engine.

use crate::system::Tid;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for TaskOpt operations
#[derive(Error, Debug)]
pub enum TuneError {
    /// Startup failed (log directory, subscriber installation)
    #[error("Setup failed at '{path}': {source}")]
    Setup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Target thread is out of range or no longer present in the process tree
    #[error("Invalid TID {0}")]
    InvalidTarget(Tid),

    /// Name pattern rejected by the sanitizer
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// Name pattern passed the sanitizer but is not a valid expression
    #[error("Pattern '{pattern}' does not compile: {message}")]
    Pattern { pattern: String, message: String },

    /// A scheduling call was rejected by the kernel
    #[error("{op} failed for TID {tid}: {source}")]
    Syscall {
        op: &'static str,
        tid: Tid,
        #[source]
        source: std::io::Error,
    },

    /// Unsupported operation on this platform
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// I/O error while reading the process or CPU tree
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TuneError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a setup error with path context
    pub fn setup(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Setup {
            path: path.into(),
            source,
        }
    }

    /// Create a syscall error from the kernel's error value
    pub fn syscall(op: &'static str, tid: Tid, source: impl Into<std::io::Error>) -> Self {
        Self::Syscall {
            op,
            tid,
            source: source.into(),
        }
    }

    /// Setup errors abort the run; all others are per-operation
    pub fn is_setup_failure(&self) -> bool {
        matches!(self, Self::Setup { .. })
    }
}

/// Result type alias for TaskOpt operations
pub type Result<T> = std::result::Result<T, TuneError>;

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| TuneError::io(path, e))
    }
}
