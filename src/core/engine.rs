//! Tuning engine
//!
//! Walks the plan tier by tier: for each pattern it finds matching
//! processes, lists their threads and applies the task's operation to every
//! thread, counting each outcome once.

use crate::config::{TaskSpec, Tier, TunerConfig, TuningOperation, TuningPlan, TuningStep};
use crate::core::{StatsSnapshot, StatsTracker};
use crate::process::ProcessScanner;
use crate::system::{CpuTopology, Sanitizer, SchedControl, SyscallApplier, Tid};
use rayon::prelude::*;
use std::sync::Arc;

/// Applies a tuning plan to the live process tree
pub struct TuningEngine<S> {
    scanner: ProcessScanner,
    applier: SyscallApplier<S>,
    topology: CpuTopology,
    stats: Arc<StatsTracker>,
    parallel: bool,
}

impl<S: SchedControl> TuningEngine<S> {
    /// Assemble an engine from its parts
    pub fn new(
        scanner: ProcessScanner,
        applier: SyscallApplier<S>,
        topology: CpuTopology,
        stats: Arc<StatsTracker>,
    ) -> Self {
        Self {
            scanner,
            applier,
            topology,
            stats,
            parallel: false,
        }
    }

    /// Build an engine for the roots and retry budget in `config`
    pub fn from_config(config: &TunerConfig, sched: S, stats: Arc<StatsTracker>) -> Self {
        let sanitizer = Sanitizer::new(&config.proc_root).with_id_ceiling(config.id_ceiling);
        let applier = SyscallApplier::new(sched, sanitizer.clone()).with_retry(config.retry);

        Self::new(
            ProcessScanner::new(sanitizer),
            applier,
            CpuTopology::new(&config.cpu_root),
            stats,
        )
        .with_parallel(config.parallel)
    }

    /// Fan out per-thread work across the rayon pool
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Shared counters
    pub fn stats(&self) -> &StatsTracker {
        &self.stats
    }

    /// CPU topology used for affinity steps
    pub fn topology(&self) -> &CpuTopology {
        &self.topology
    }

    /// Applier used for every step
    pub fn applier(&self) -> &SyscallApplier<S> {
        &self.applier
    }

    /// Run every tier in order, then report
    pub fn run(&self, plan: &TuningPlan) -> StatsSnapshot {
        tracing::info!("=== Starting Advanced System Optimization ===");

        for tier in &plan.tiers {
            self.run_tier(tier);
        }

        self.report();
        tracing::info!("=== System Optimization Completed ===");
        self.stats.snapshot()
    }

    /// Apply every task of one tier, in order
    pub fn run_tier(&self, tier: &Tier) {
        tracing::info!("Optimizing {} tasks...", tier.kind.name());
        for task in &tier.tasks {
            self.apply_task(task);
        }
    }

    /// Apply a task's operation to every thread matching its pattern
    pub fn apply_task(&self, task: &TaskSpec) {
        self.apply_to_pattern(&task.pattern, |tid| self.execute(&task.operation, tid), &task.label);
    }

    /// Run `operation` on every thread of every process matching `pattern`
    ///
    /// No match is not a failure: it is logged and the counters are left
    /// untouched.
    pub fn apply_to_pattern<F>(&self, pattern: &str, operation: F, label: &str)
    where
        F: Fn(Tid) -> bool + Sync,
    {
        let pids = self.scanner.find_processes(pattern);
        if pids.is_empty() {
            tracing::info!("No processes found for: {}", pattern);
            return;
        }

        let apply = |tid: Tid| -> bool {
            if operation(tid) {
                self.stats.record_success();
                true
            } else {
                self.stats.record_failure();
                tracing::error!("Failed {} for TID {}", label, tid);
                false
            }
        };

        let (threads, failed) = if self.parallel {
            pids.par_iter()
                .map(|&pid| {
                    self.scanner
                        .find_threads(pid)
                        .par_iter()
                        .map(|&tid| (1usize, usize::from(!apply(tid))))
                        .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1))
                })
                .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1))
        } else {
            pids.iter()
                .flat_map(|&pid| self.scanner.find_threads(pid))
                .fold((0usize, 0usize), |acc, tid| (acc.0 + 1, acc.1 + usize::from(!apply(tid))))
        };

        tracing::info!(
            "{}: {} processes, {} threads, {} failed ({})",
            pattern,
            pids.len(),
            threads,
            failed,
            label
        );
    }

    /// Apply each step in order, stopping at the first that fails
    pub fn execute(&self, operation: &TuningOperation, tid: Tid) -> bool {
        operation.steps.iter().all(|step| match *step {
            TuningStep::Nice(value) => self.applier.set_niceness(tid, value),
            TuningStep::Affinity(class) => self.applier.set_affinity(tid, &self.topology.cores(class)),
            TuningStep::Realtime(priority) => self.applier.set_realtime(tid, priority),
            TuningStep::IoClass(class) => self.applier.set_io_class(tid, class),
        })
    }

    /// Log the aggregate counters
    pub fn report(&self) {
        self.stats.report();
    }
}
