//! CPU topology detection for big.LITTLE style systems
//!
//! Cores are split into performance and efficiency sets by their maximum
//! clock frequency as reported by cpufreq. Detection runs once per
//! [`CpuTopology`] instance and the result never changes afterwards.

use crate::error::{IoResultExt, Result, TuneError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Cores with a max frequency above this (kHz) are performance cores
pub const PERF_FREQ_THRESHOLD_KHZ: u64 = 2_000_000;

/// Probing never goes past the kernel's affinity mask size
pub const MAX_PROBED_CORES: usize = 1024;

/// Default sysfs location of per-core directories
pub const DEFAULT_CPU_ROOT: &str = "/sys/devices/system/cpu";

/// Ordered set of core indices
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreSet(BTreeSet<usize>);

impl CoreSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a core
    pub fn insert(&mut self, core: usize) -> bool {
        self.0.insert(core)
    }

    /// Does the set contain `core`
    pub fn contains(&self, core: usize) -> bool {
        self.0.contains(&core)
    }

    /// Cores in ascending order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    /// Number of cores
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no cores
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Union of two sets
    pub fn union(&self, other: &CoreSet) -> CoreSet {
        CoreSet(self.0.union(&other.0).copied().collect())
    }

    /// True if the sets share no core
    pub fn is_disjoint(&self, other: &CoreSet) -> bool {
        self.0.is_disjoint(&other.0)
    }
}

impl FromIterator<usize> for CoreSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        CoreSet(iter.into_iter().collect())
    }
}

impl std::fmt::Display for CoreSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cores: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        write!(f, "[{}]", cores.join(","))
    }
}

/// Which core set an affinity step targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreClass {
    /// Cores above the frequency threshold
    Performance,
    /// Cores at or below the frequency threshold
    Efficiency,
    /// Every probed core
    All,
}

/// Result of a topology probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreLayout {
    /// Performance cores
    pub perf_cores: CoreSet,
    /// Efficiency cores
    pub eff_cores: CoreSet,
    /// Number of probed cores
    pub total_cores: usize,
    /// Layout came from the built-in default rather than sysfs
    pub is_fallback: bool,
}

impl CoreLayout {
    /// Built-in layout used when probing fails
    ///
    /// Efficiency cores 0-3 and performance cores 4-7. This matches one
    /// common 4+4 big.LITTLE arrangement and is only a guess for anything
    /// else.
    pub fn fallback() -> Self {
        Self {
            perf_cores: (4..8).collect(),
            eff_cores: (0..4).collect(),
            total_cores: 8,
            is_fallback: true,
        }
    }

    /// Probe `<cpu_root>/cpu<N>/cpufreq/cpuinfo_max_freq` for N = 0, 1, ...
    ///
    /// Stops at the first core without the attribute. An unreadable or
    /// unparsable attribute, or no attribute at all, is an error.
    pub fn probe(cpu_root: &Path) -> Result<Self> {
        let mut perf_cores = CoreSet::new();
        let mut eff_cores = CoreSet::new();
        let mut total_cores = 0;

        for core in 0..MAX_PROBED_CORES {
            let freq_path = cpu_root
                .join(format!("cpu{}", core))
                .join("cpufreq/cpuinfo_max_freq");

            let content = match std::fs::read_to_string(&freq_path) {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => break,
                read => read.with_path(&freq_path)?,
            };

            let max_freq: u64 = content.trim().parse().map_err(|e| {
                TuneError::io(&freq_path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            })?;

            total_cores += 1;
            if max_freq > PERF_FREQ_THRESHOLD_KHZ {
                perf_cores.insert(core);
            } else {
                eff_cores.insert(core);
            }
        }

        if total_cores == 0 {
            return Err(TuneError::io(
                cpu_root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no cpufreq data"),
            ));
        }

        Ok(Self {
            perf_cores,
            eff_cores,
            total_cores,
            is_fallback: false,
        })
    }
}

/// Lazily detected CPU topology
///
/// The first query probes sysfs; concurrent first callers block on the same
/// computation and every later query reads the cached layout.
#[derive(Debug)]
pub struct CpuTopology {
    cpu_root: PathBuf,
    layout: OnceLock<CoreLayout>,
}

impl CpuTopology {
    /// Topology backed by the given sysfs CPU directory
    pub fn new(cpu_root: impl Into<PathBuf>) -> Self {
        Self {
            cpu_root: cpu_root.into(),
            layout: OnceLock::new(),
        }
    }

    /// Detected (or fallback) layout, computing it on first use
    pub fn layout(&self) -> &CoreLayout {
        self.layout.get_or_init(|| self.detect())
    }

    fn detect(&self) -> CoreLayout {
        match CoreLayout::probe(&self.cpu_root) {
            Ok(layout) => {
                tracing::debug!(
                    "Detected {} cores: performance {}, efficiency {}",
                    layout.total_cores,
                    layout.perf_cores,
                    layout.eff_cores
                );
                layout
            }
            Err(err) => {
                tracing::warn!("Failed to detect CPU topology ({}), using defaults", err);
                CoreLayout::fallback()
            }
        }
    }

    /// Cores above the frequency threshold
    pub fn performance_cores(&self) -> &CoreSet {
        &self.layout().perf_cores
    }

    /// Cores at or below the frequency threshold
    pub fn efficiency_cores(&self) -> &CoreSet {
        &self.layout().eff_cores
    }

    /// Every probed core, `0..total_cores`
    pub fn all_cores(&self) -> CoreSet {
        (0..self.total_cores()).collect()
    }

    /// Number of probed cores
    pub fn total_cores(&self) -> usize {
        self.layout().total_cores
    }

    /// True if the built-in default layout is in use
    pub fn is_fallback(&self) -> bool {
        self.layout().is_fallback
    }

    /// Resolve a core class to a concrete set
    pub fn cores(&self, class: CoreClass) -> CoreSet {
        match class {
            CoreClass::Performance => self.performance_cores().clone(),
            CoreClass::Efficiency => self.efficiency_cores().clone(),
            CoreClass::All => self.all_cores(),
        }
    }
}

impl Default for CpuTopology {
    fn default() -> Self {
        Self::new(DEFAULT_CPU_ROOT)
    }
}
