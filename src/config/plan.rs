//! Tuning plan: which tasks get which treatment
//!
//! The plan is three ordered tiers of (pattern, operation, label). The
//! built-in tables target Android system services and kernel workers.

use crate::system::{CoreClass, IoClass};
use serde::{Deserialize, Serialize};

/// One scheduling change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TuningStep {
    /// setpriority to this niceness
    Nice(i32),
    /// Pin to a class of cores
    Affinity(CoreClass),
    /// SCHED_FIFO at this priority
    Realtime(i32),
    /// ioprio_set to this class
    IoClass(IoClass),
}

/// Steps applied in order to each thread; stops at the first failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuningOperation {
    /// Ordered steps
    pub steps: Vec<TuningStep>,
}

impl TuningOperation {
    /// Operation from an ordered list of steps
    pub fn new(steps: impl Into<Vec<TuningStep>>) -> Self {
        Self {
            steps: steps.into(),
        }
    }

    /// Favored: lower niceness, performance cores
    pub fn high_priority() -> Self {
        Self::new([TuningStep::Nice(-10), TuningStep::Affinity(CoreClass::Performance)])
    }

    /// SCHED_FIFO 50 on performance cores
    pub fn realtime() -> Self {
        Self::new([TuningStep::Realtime(50), TuningStep::Affinity(CoreClass::Performance)])
    }

    /// Background: higher niceness, efficiency cores, idle I/O
    pub fn low_priority() -> Self {
        Self::new([
            TuningStep::Nice(5),
            TuningStep::Affinity(CoreClass::Efficiency),
            TuningStep::IoClass(IoClass::Idle),
        ])
    }
}

/// A name pattern and what to do with its threads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Expression matched against the command name
    pub pattern: String,
    /// Operation applied to every matching thread
    pub operation: TuningOperation,
    /// Name used in failure logs
    pub label: String,
}

impl TaskSpec {
    /// Create a task spec
    pub fn new(pattern: impl Into<String>, operation: TuningOperation, label: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            operation,
            label: label.into(),
        }
    }
}

/// Tier identity, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierKind {
    /// Latency-sensitive services
    HighPriority,
    /// Display and input kernel workers
    RealTime,
    /// Background maintenance
    LowPriority,
}

impl TierKind {
    /// Name used in progress logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::HighPriority => "high priority",
            Self::RealTime => "real-time",
            Self::LowPriority => "low priority",
        }
    }
}

/// Tasks handled together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    /// Which tier this is
    pub kind: TierKind,
    /// Tasks in order
    pub tasks: Vec<TaskSpec>,
}

impl Tier {
    /// Tier whose patterns all share one operation and label
    pub fn uniform(kind: TierKind, patterns: &[&str], operation: TuningOperation, label: &str) -> Self {
        Self {
            kind,
            tasks: patterns
                .iter()
                .map(|p| TaskSpec::new(*p, operation.clone(), label))
                .collect(),
        }
    }
}

/// Services and workers that should get more CPU
pub const HIGH_PRIO_TASKS: &[&str] = &[
    "servicemanag",
    "zygote",
    "system_server",
    "surfaceflinger",
    "kblockd",
    "writeback",
    "Input",
    "composer",
];

/// Kernel threads on the display and touch path
pub const RT_TASKS: &[&str] = &[
    "kgsl_worker_thread",
    "crtc_commit",
    "crtc_event",
    "pp_event",
    "fts_wq",
    "nvt_ts_work",
];

/// Background maintenance
pub const LOW_PRIO_TASKS: &[&str] = &["f2fs_gc", "wlan_logging_th"];

/// Ordered tiers for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuningPlan {
    /// Tiers, executed in this order
    pub tiers: Vec<Tier>,
}

impl TuningPlan {
    /// Plan from explicit tiers, sorted into execution order
    pub fn new(mut tiers: Vec<Tier>) -> Self {
        tiers.sort_by_key(|t| t.kind);
        Self { tiers }
    }

    /// Number of tasks across all tiers
    pub fn task_count(&self) -> usize {
        self.tiers.iter().map(|t| t.tasks.len()).sum()
    }
}

impl Default for TuningPlan {
    fn default() -> Self {
        Self::new(vec![
            Tier::uniform(
                TierKind::HighPriority,
                HIGH_PRIO_TASKS,
                TuningOperation::high_priority(),
                "high_prio",
            ),
            Tier::uniform(TierKind::RealTime, RT_TASKS, TuningOperation::realtime(), "rt"),
            Tier::uniform(
                TierKind::LowPriority,
                LOW_PRIO_TASKS,
                TuningOperation::low_priority(),
                "low_prio",
            ),
        ])
    }
}
