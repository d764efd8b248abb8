//! TaskOpt CLI - one-shot scheduler tuning
//!
//! Exits 0 after a completed pass, whatever the individual outcomes; exits 1
//! only when setup fails before any tuning is attempted.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use taskopt::config::{CliArgs, TunerConfig, TuningPlan};
use taskopt::core::{StatsSnapshot, StatsTracker, TuningEngine};
use taskopt::logging;
use taskopt::system::{DryRunSched, KernelSched, SchedControl};

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();
    let plan = TuningPlan::default();

    if args.print_plan {
        match serde_json::to_string_pretty(&plan) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let config = TunerConfig::from_cli(&args);

    if let Err(e) = setup(&config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    let summary = run(&config, &plan);

    if args.json {
        match serde_json::to_string(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!("Cannot encode summary: {}", e),
        }
    }
}

fn setup(config: &TunerConfig) -> anyhow::Result<()> {
    logging::init(&config.log).with_context(|| {
        format!("Failed to set up logging in {}", config.log.log_dir.display())
    })?;

    tracing::debug!(
        "proc root {}, cpu root {}, retry {:?}",
        config.proc_root.display(),
        config.cpu_root.display(),
        config.retry
    );
    Ok(())
}

fn run(config: &TunerConfig, plan: &TuningPlan) -> StatsSnapshot {
    let sched: Box<dyn SchedControl> = if config.dry_run {
        tracing::info!("Dry run: no scheduling changes will be made");
        Box::new(DryRunSched)
    } else {
        Box::new(KernelSched)
    };

    let stats = Arc::new(StatsTracker::new());
    let engine = TuningEngine::from_config(config, sched, stats);
    engine.run(plan)
}
