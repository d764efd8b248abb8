//! Scheduling control interface
//!
//! [`SchedControl`] is the boundary to the host kernel: one call, one thread,
//! one attempt. Validation and retry live in [`super::SyscallApplier`].

use super::{CoreSet, Tid};
use crate::error::{Result, TuneError};
use serde::{Deserialize, Serialize};

/// I/O scheduling class as understood by `ioprio_set`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IoClass {
    /// No explicit class, derived from CPU niceness
    None = 0,
    /// Real-time I/O class
    RealTime = 1,
    /// Best-effort I/O class
    BestEffort = 2,
    /// Only served when nobody else needs the disk
    Idle = 3,
}

impl IoClass {
    /// Bit position of the class inside an ioprio value
    pub const SHIFT: u32 = 13;

    /// Encode as an ioprio value with level 0
    pub fn ioprio(self) -> i32 {
        (self as i32) << Self::SHIFT
    }

    /// Short name for logs
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::RealTime => "realtime",
            Self::BestEffort => "best-effort",
            Self::Idle => "idle",
        }
    }
}

/// Host scheduling controls, one attempt per call
pub trait SchedControl: Send + Sync {
    /// Restrict the thread to the given cores
    fn set_affinity(&self, tid: Tid, cores: &CoreSet) -> Result<()>;

    /// Set the niceness of the thread
    fn set_niceness(&self, tid: Tid, value: i32) -> Result<()>;

    /// Switch the thread to SCHED_FIFO at `priority`
    fn set_realtime(&self, tid: Tid, priority: i32) -> Result<()>;

    /// Set the I/O scheduling class of the thread
    fn set_io_class(&self, tid: Tid, class: IoClass) -> Result<()>;
}

impl<T: SchedControl + ?Sized> SchedControl for Box<T> {
    fn set_affinity(&self, tid: Tid, cores: &CoreSet) -> Result<()> {
        (**self).set_affinity(tid, cores)
    }

    fn set_niceness(&self, tid: Tid, value: i32) -> Result<()> {
        (**self).set_niceness(tid, value)
    }

    fn set_realtime(&self, tid: Tid, priority: i32) -> Result<()> {
        (**self).set_realtime(tid, priority)
    }

    fn set_io_class(&self, tid: Tid, class: IoClass) -> Result<()> {
        (**self).set_io_class(tid, class)
    }
}

/// Applies settings through real syscalls
#[derive(Debug, Clone, Copy, Default)]
pub struct KernelSched;

#[cfg(any(target_os = "linux", target_os = "android"))]
impl SchedControl for KernelSched {
    fn set_affinity(&self, tid: Tid, cores: &CoreSet) -> Result<()> {
        use nix::sched::{sched_setaffinity, CpuSet};
        use nix::unistd::Pid;

        let mut set = CpuSet::new();
        for core in cores.iter() {
            set.set(core)
                .map_err(|e| TuneError::syscall("sched_setaffinity", tid, e))?;
        }

        sched_setaffinity(Pid::from_raw(tid), &set)
            .map_err(|e| TuneError::syscall("sched_setaffinity", tid, e))
    }

    fn set_niceness(&self, tid: Tid, value: i32) -> Result<()> {
        use nix::errno::Errno;

        // -1 is a legal return for some libcs, so errno decides. A call that
        // leaves errno untouched counts as success.
        Errno::clear();
        let ret = unsafe { libc::setpriority(libc::PRIO_PROCESS, tid as libc::id_t, value) };
        let errno = Errno::last_raw();

        if ret == 0 || errno == 0 {
            Ok(())
        } else {
            Err(TuneError::syscall("setpriority", tid, Errno::from_raw(errno)))
        }
    }

    fn set_realtime(&self, tid: Tid, priority: i32) -> Result<()> {
        // Zeroed first: some libcs carry extra reserved fields
        let mut param: libc::sched_param = unsafe { std::mem::zeroed() };
        param.sched_priority = priority;

        let ret = unsafe { libc::sched_setscheduler(tid, libc::SCHED_FIFO, &param) };
        if ret == 0 {
            Ok(())
        } else {
            Err(TuneError::syscall(
                "sched_setscheduler",
                tid,
                std::io::Error::last_os_error(),
            ))
        }
    }

    fn set_io_class(&self, tid: Tid, class: IoClass) -> Result<()> {
        const IOPRIO_WHO_PROCESS: libc::c_int = 1;

        let ret = unsafe {
            libc::syscall(
                libc::SYS_ioprio_set,
                IOPRIO_WHO_PROCESS,
                tid as libc::c_int,
                class.ioprio() as libc::c_int,
            )
        };
        if ret == 0 {
            Ok(())
        } else {
            Err(TuneError::syscall(
                "ioprio_set",
                tid,
                std::io::Error::last_os_error(),
            ))
        }
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
impl SchedControl for KernelSched {
    fn set_affinity(&self, _tid: Tid, _cores: &CoreSet) -> Result<()> {
        Err(TuneError::Unsupported("thread affinity".to_string()))
    }

    fn set_niceness(&self, _tid: Tid, _value: i32) -> Result<()> {
        Err(TuneError::Unsupported("per-thread niceness".to_string()))
    }

    fn set_realtime(&self, _tid: Tid, _priority: i32) -> Result<()> {
        Err(TuneError::Unsupported("SCHED_FIFO".to_string()))
    }

    fn set_io_class(&self, _tid: Tid, _class: IoClass) -> Result<()> {
        Err(TuneError::Unsupported("ioprio_set".to_string()))
    }
}

/// Logs what would be applied and reports success
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunSched;

impl SchedControl for DryRunSched {
    fn set_affinity(&self, tid: Tid, cores: &CoreSet) -> Result<()> {
        tracing::info!("[dry-run] TID {}: affinity {}", tid, cores);
        Ok(())
    }

    fn set_niceness(&self, tid: Tid, value: i32) -> Result<()> {
        tracing::info!("[dry-run] TID {}: nice {}", tid, value);
        Ok(())
    }

    fn set_realtime(&self, tid: Tid, priority: i32) -> Result<()> {
        tracing::info!("[dry-run] TID {}: SCHED_FIFO priority {}", tid, priority);
        Ok(())
    }

    fn set_io_class(&self, tid: Tid, class: IoClass) -> Result<()> {
        tracing::info!("[dry-run] TID {}: I/O class {}", tid, class.name());
        Ok(())
    }
}
