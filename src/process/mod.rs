//! Process discovery
//!
//! Pattern-based enumeration of processes and their threads.

mod scanner;

pub use scanner::ProcessScanner;
