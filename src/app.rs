//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - initialises logging
//! - parses CLI arguments
//! - turns them into an explicit `PipelineConfig`
//! - runs one pipeline stage and prints its summary

use std::time::Duration;

use clap::Parser;
use log::error;

use crate::cli::{BackfillArgs, Command, DailyArgs, LoadArgs, QcArgs};
use crate::config::{PipelineConfig, QcPolicy};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `fx` binary.
pub fn run() -> Result<(), AppError> {
    init_logging();
    let cli = crate::cli::Cli::parse();

    let result = match cli.command {
        Command::Backfill(args) => handle_backfill(&args),
        Command::Daily(args) => handle_daily(&args),
        Command::Load(args) => handle_load(&args),
        Command::Qc(args) => handle_qc(&args),
    };

    if let Err(err) = &result {
        error!("Run failed: {err}");
    }
    result
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();
}

fn handle_backfill(args: &BackfillArgs) -> Result<(), AppError> {
    let config = backfill_config_from_args(args);
    let summary = pipeline::run_backfill(&config)?;
    println!("{}", crate::report::format_backfill_summary(&summary));
    Ok(())
}

fn handle_daily(args: &DailyArgs) -> Result<(), AppError> {
    let config = daily_config_from_args(args);
    let outcome = pipeline::run_daily(&config)?;
    println!("{}", crate::report::format_incremental_outcome(&outcome));
    Ok(())
}

fn handle_load(args: &LoadArgs) -> Result<(), AppError> {
    let config = load_config_from_args(args);
    let summary = pipeline::run_load(&config)?;
    println!("{}", crate::report::format_load_summary(&summary));
    Ok(())
}

fn handle_qc(args: &QcArgs) -> Result<(), AppError> {
    let config = PipelineConfig {
        snapshot_dir: args.dir.snapshot_dir.clone(),
        qc: QcPolicy {
            max_gap_days: args.max_gap_days,
        },
        ..PipelineConfig::default()
    };
    for (year, report, warnings) in pipeline::run_qc(&config, args.year)? {
        for w in &warnings {
            log::warn!("QC {year}: {w}");
        }
        println!("{}", crate::report::format_continuity_report(year, &report, &warnings));
    }
    Ok(())
}

pub fn backfill_config_from_args(args: &BackfillArgs) -> PipelineConfig {
    PipelineConfig {
        snapshot_dir: args.dir.snapshot_dir.clone(),
        start_year: args.start_year,
        pace: Duration::from_millis(args.pace_ms),
        ..PipelineConfig::default()
    }
}

pub fn daily_config_from_args(args: &DailyArgs) -> PipelineConfig {
    PipelineConfig {
        snapshot_dir: args.dir.snapshot_dir.clone(),
        run_qc: !args.skip_qc,
        qc: QcPolicy {
            max_gap_days: args.max_gap_days,
        },
        ..PipelineConfig::default()
    }
}

pub fn load_config_from_args(args: &LoadArgs) -> PipelineConfig {
    PipelineConfig {
        snapshot_dir: args.dir.snapshot_dir.clone(),
        db_path: args.db_path.clone(),
        ..PipelineConfig::default()
    }
}
