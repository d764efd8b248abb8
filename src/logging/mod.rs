//! Logging setup
//!
//! Everything logs through `tracing`. A run writes to three places:
//! stderr (filtered by `RUST_LOG`), `main.log` (everything at the configured
//! level) and `error.log` (warnings and errors only). Both files rotate at
//! [`LogConfig::max_bytes`].

mod rotate;

pub use rotate::{RotatingLog, RotatingWriter};

use crate::config::LogConfig;
use crate::error::{Result, TuneError};
use tracing::Subscriber;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// `[YYYY-MM-DD HH:MM:SS]` in local time
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "[{}]", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Level for `-v` count: info, debug, trace
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Subscriber writing `main.log` and `error.log` under `config.log_dir`
///
/// Creates the directory first; failing to do so is a setup error.
pub fn file_subscriber(
    config: &LogConfig,
) -> Result<impl Subscriber + for<'a> LookupSpan<'a> + Send + Sync + 'static> {
    std::fs::create_dir_all(&config.log_dir).map_err(|e| TuneError::setup(&config.log_dir, e))?;

    let main_layer = fmt::layer()
        .with_writer(RotatingLog::new(config.main_log(), config.max_bytes))
        .with_ansi(false)
        .with_target(false)
        .with_timer(LocalTimer)
        .with_filter(level_for(config.verbosity));

    let error_layer = fmt::layer()
        .with_writer(RotatingLog::new(config.error_log(), config.max_bytes))
        .with_ansi(false)
        .with_target(false)
        .with_timer(LocalTimer)
        .with_filter(LevelFilter::WARN);

    Ok(tracing_subscriber::registry().with(main_layer).with(error_layer))
}

/// Install the process-wide subscriber: log files plus stderr
pub fn init(config: &LogConfig) -> Result<()> {
    let stderr_layer = (!config.quiet).then(|| {
        let filter = EnvFilter::builder()
            .with_default_directive(level_for(config.verbosity).into())
            .from_env_lossy();
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter)
    });

    file_subscriber(config)?
        .with(stderr_layer)
        .try_init()
        .map_err(|e| TuneError::setup(&config.log_dir, std::io::Error::other(e)))
}
