//! Size-rotated append-only log file
//!
//! Each event is written under a mutex with a fresh append handle, so lines
//! from concurrent threads never interleave. A file that has grown past the
//! limit is renamed to `<name>.old` before the next write.

use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing_subscriber::fmt::MakeWriter;

/// Log file that rotates once it exceeds `max_bytes`
#[derive(Debug)]
pub struct RotatingLog {
    path: PathBuf,
    max_bytes: u64,
    lock: Mutex<()>,
}

impl RotatingLog {
    /// Log at `path`, rotated past `max_bytes`
    pub fn new(path: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            path: path.into(),
            max_bytes,
            lock: Mutex::new(()),
        }
    }

    /// Path of the live file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path the live file is rotated to
    pub fn rotated_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".old");
        PathBuf::from(name)
    }

    fn rotate_if_needed(&self) {
        let oversized = std::fs::metadata(&self.path)
            .map(|m| m.len() > self.max_bytes)
            .unwrap_or(false);
        if oversized {
            if let Err(e) = std::fs::rename(&self.path, self.rotated_path()) {
                eprintln!("Logger error: cannot rotate {}: {}", self.path.display(), e);
            }
        }
    }

    fn append(&self, buf: &[u8]) -> std::io::Result<()> {
        self.rotate_if_needed();
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(buf)
    }
}

/// Writer for a single event; holds the file lock until dropped
pub struct RotatingWriter<'a> {
    log: &'a RotatingLog,
    _guard: MutexGuard<'a, ()>,
}

impl Write for RotatingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.log.append(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for RotatingLog {
    type Writer = RotatingWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingWriter {
            log: self,
            _guard: self.lock.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }
}
