//! Fixtures shared by unit tests: fake procfs and cpufreq trees, a recording
//! scheduler control and a log capture.

use crate::error::{Result, TuneError};
use crate::process::ProcessScanner;
use crate::system::{CoreSet, IoClass, Sanitizer, SchedControl, Tid};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Process tree in a temp directory: `<pid>/comm`, `<pid>/task/<tid>`, `<tid>/`
pub struct FakeProcTree {
    dir: TempDir,
}

impl FakeProcTree {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn add_process(&self, pid: Tid, comm: &str, tids: &[Tid]) {
        let proc_dir = self.root().join(pid.to_string());
        std::fs::create_dir_all(proc_dir.join("task")).unwrap();
        std::fs::write(proc_dir.join("comm"), format!("{}\n", comm)).unwrap();

        for tid in tids {
            std::fs::create_dir_all(proc_dir.join("task").join(tid.to_string())).unwrap();
            std::fs::create_dir_all(self.root().join(tid.to_string())).unwrap();
        }
    }

    pub fn sanitizer(&self) -> Sanitizer {
        Sanitizer::new(self.root())
    }

    pub fn scanner(&self) -> ProcessScanner {
        ProcessScanner::new(self.sanitizer())
    }
}

/// cpufreq tree in a temp directory: `cpu<N>/cpufreq/cpuinfo_max_freq`
pub struct FakeCpuTree {
    dir: TempDir,
}

impl FakeCpuTree {
    pub fn new(max_freqs: &[u64]) -> Self {
        let tree = Self {
            dir: TempDir::new().unwrap(),
        };
        for (core, freq) in max_freqs.iter().enumerate() {
            tree.add_core(core, &format!("{}\n", freq));
        }
        tree
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn add_core(&self, core: usize, content: &str) {
        let freq_dir = self.root().join(format!("cpu{}", core)).join("cpufreq");
        std::fs::create_dir_all(&freq_dir).unwrap();
        std::fs::write(freq_dir.join("cpuinfo_max_freq"), content).unwrap();
    }
}

/// One call seen by [`RecordingSched`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedCall {
    Affinity(Tid, Vec<usize>),
    Nice(Tid, i32),
    Realtime(Tid, i32),
    Io(Tid, IoClass),
}

enum FailMode {
    Never,
    Always,
    FirstN(usize),
    AffinityOnly,
}

/// Scheduler control that records calls and fails on demand
pub struct RecordingSched {
    calls: Mutex<Vec<SchedCall>>,
    seen: AtomicUsize,
    mode: FailMode,
}

impl RecordingSched {
    fn with_mode(mode: FailMode) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            seen: AtomicUsize::new(0),
            mode,
        }
    }

    pub fn succeeding() -> Self {
        Self::with_mode(FailMode::Never)
    }

    pub fn failing() -> Self {
        Self::with_mode(FailMode::Always)
    }

    pub fn failing_first(n: usize) -> Self {
        Self::with_mode(FailMode::FirstN(n))
    }

    pub fn failing_affinity() -> Self {
        Self::with_mode(FailMode::AffinityOnly)
    }

    pub fn calls(&self) -> Vec<SchedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.seen.load(Ordering::SeqCst)
    }

    fn record(&self, op: &'static str, tid: Tid, call: SchedCall) -> Result<()> {
        let index = self.seen.fetch_add(1, Ordering::SeqCst);
        let is_affinity = matches!(call, SchedCall::Affinity(..));
        self.calls.lock().unwrap().push(call);

        let fail = match self.mode {
            FailMode::Never => false,
            FailMode::Always => true,
            FailMode::FirstN(n) => index < n,
            FailMode::AffinityOnly => is_affinity,
        };
        if fail {
            Err(TuneError::syscall(
                op,
                tid,
                std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            ))
        } else {
            Ok(())
        }
    }
}

impl SchedControl for RecordingSched {
    fn set_affinity(&self, tid: Tid, cores: &CoreSet) -> Result<()> {
        self.record("sched_setaffinity", tid, SchedCall::Affinity(tid, cores.iter().collect()))
    }

    fn set_niceness(&self, tid: Tid, value: i32) -> Result<()> {
        self.record("setpriority", tid, SchedCall::Nice(tid, value))
    }

    fn set_realtime(&self, tid: Tid, priority: i32) -> Result<()> {
        self.record("sched_setscheduler", tid, SchedCall::Realtime(tid, priority))
    }

    fn set_io_class(&self, tid: Tid, class: IoClass) -> Result<()> {
        self.record("ioprio_set", tid, SchedCall::Io(tid, class))
    }
}

/// Collects formatted log lines emitted on the current thread
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capture<R>(&self, f: impl FnOnce() -> R) -> R {
        let buf = Arc::clone(&self.0);
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || CaptureWriter(Arc::clone(&buf)))
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.contents().matches(needle).count()
    }
}
