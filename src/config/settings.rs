//! Configuration settings for TaskOpt
//!
//! Defines the CLI arguments, runtime configuration and defaults for a
//! tuning pass.

use crate::system::sanitize::DEFAULT_ID_CEILING;
use crate::system::topology::DEFAULT_CPU_ROOT;
use crate::system::{RetryPolicy, Tid};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Default log directory
pub const DEFAULT_LOG_DIR: &str = "/data/adb/modules/task_optimizer/logs/";

/// Default process tree root
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Log files are rotated once they grow past this size
pub const DEFAULT_MAX_LOG_BYTES: u64 = 1024 * 1024;

/// TaskOpt - one-shot scheduler tuning for system tasks
#[derive(Parser, Debug, Clone)]
#[command(name = "taskopt")]
#[command(author = "TaskOpt Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pin, renice and reprioritize system tasks by name")]
#[command(long_about = r#"
TaskOpt makes a single pass over the process tree and applies scheduling
hints to known system tasks:

  - high priority services:  nice -10, performance cores
  - real-time kernel workers: SCHED_FIFO 50, performance cores
  - background maintenance:  nice 5, efficiency cores, idle I/O class

Individual failures are logged and counted; the run always completes.

Examples:
  taskopt                          # Tune with the built-in task tables
  taskopt --dry-run -v             # Show what would be changed
  taskopt --print-plan             # Dump the task tables as JSON
"#)]
pub struct CliArgs {
    /// Directory for main.log and error.log
    #[arg(long, default_value = DEFAULT_LOG_DIR, value_name = "DIR", env = "TASKOPT_LOG_DIR")]
    pub log_dir: PathBuf,

    /// Root of the process tree
    #[arg(long, default_value = DEFAULT_PROC_ROOT, value_name = "DIR")]
    pub proc_root: PathBuf,

    /// Root of the per-core cpufreq directories
    #[arg(long, default_value = DEFAULT_CPU_ROOT, value_name = "DIR")]
    pub cpu_root: PathBuf,

    /// Process and thread IDs at or above this value are ignored
    #[arg(long, default_value_t = DEFAULT_ID_CEILING, value_name = "ID")]
    pub id_ceiling: Tid,

    /// Attempts per scheduling call
    #[arg(long, default_value = "3", value_name = "NUM")]
    pub max_retries: u32,

    /// Pause between attempts (e.g. 50ms, 1s)
    #[arg(long, default_value = "50ms", value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub retry_delay: Duration,

    /// Apply operations to threads in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Scan and log, but change nothing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print the tuning plan as JSON and exit
    #[arg(long)]
    pub print_plan: bool,

    /// Print the final counters as JSON
    #[arg(long)]
    pub json: bool,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode: nothing on stderr
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

/// Logging destinations and verbosity
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Directory for main.log and error.log
    pub log_dir: PathBuf,
    /// Rotation threshold for each file
    pub max_bytes: u64,
    /// 0 = info, 1 = debug, 2+ = trace
    pub verbosity: u8,
    /// Suppress the stderr layer
    pub quiet: bool,
}

impl LogConfig {
    /// Path of the main log
    pub fn main_log(&self) -> PathBuf {
        self.log_dir.join("main.log")
    }

    /// Path of the warnings-and-errors log
    pub fn error_log(&self) -> PathBuf {
        self.log_dir.join("error.log")
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            max_bytes: DEFAULT_MAX_LOG_BYTES,
            verbosity: 0,
            quiet: false,
        }
    }
}

/// Runtime configuration of one tuning pass
#[derive(Debug, Clone)]
pub struct TunerConfig {
    /// Logging setup
    pub log: LogConfig,
    /// Root of the process tree
    pub proc_root: PathBuf,
    /// Root of the per-core cpufreq directories
    pub cpu_root: PathBuf,
    /// Exclusive upper bound for IDs
    pub id_ceiling: Tid,
    /// Retry budget per scheduling call
    pub retry: RetryPolicy,
    /// Fan out per-thread work with rayon
    pub parallel: bool,
    /// Use the logging-only scheduler control
    pub dry_run: bool,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            log: LogConfig::default(),
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
            cpu_root: PathBuf::from(DEFAULT_CPU_ROOT),
            id_ceiling: DEFAULT_ID_CEILING,
            retry: RetryPolicy::default(),
            parallel: false,
            dry_run: false,
        }
    }
}

impl TunerConfig {
    /// Create config from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Self {
        Self {
            log: LogConfig {
                log_dir: args.log_dir.clone(),
                max_bytes: DEFAULT_MAX_LOG_BYTES,
                verbosity: args.verbose,
                quiet: args.quiet,
            },
            proc_root: args.proc_root.clone(),
            cpu_root: args.cpu_root.clone(),
            id_ceiling: args.id_ceiling,
            retry: RetryPolicy::new(args.max_retries, args.retry_delay),
            parallel: args.parallel,
            dry_run: args.dry_run,
        }
    }
}
