//! Command-line parsing for the FX ingestion pipeline.
//!
//! Every command works without flags so it can be dropped into a crontab
//! as-is; the flags only move paths around or tune pacing/QC.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{DEFAULT_DB_PATH, DEFAULT_MAX_GAP_DAYS, DEFAULT_SNAPSHOT_DIR, DEFAULT_START_YEAR, MIN_PACE_MS};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "fx", version, about = "USD FX rate ingestion: fetch, QC and load")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch every completed year from the start year through last year.
    Backfill(BackfillArgs),
    /// Re-fetch the current year through yesterday, then run QC.
    Daily(DailyArgs),
    /// Rebuild raw.raw_ingested_data from all snapshot files.
    Load(LoadArgs),
    /// Run the continuity check over stored snapshots.
    Qc(QcArgs),
}

#[derive(Debug, Args, Clone)]
pub struct SnapshotDirArg {
    /// Directory holding usd_other_fx_rates_<year>.json files.
    #[arg(long, env = "FX_SNAPSHOT_DIR", default_value = DEFAULT_SNAPSHOT_DIR)]
    pub snapshot_dir: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct BackfillArgs {
    #[command(flatten)]
    pub dir: SnapshotDirArg,

    /// First year to fetch.
    #[arg(long, default_value_t = DEFAULT_START_YEAR)]
    pub start_year: i32,

    /// Pause between consecutive provider requests (milliseconds).
    #[arg(
        long,
        env = "FX_PACE_MS",
        default_value_t = MIN_PACE_MS,
        value_parser = clap::value_parser!(u64).range(MIN_PACE_MS..)
    )]
    pub pace_ms: u64,
}

#[derive(Debug, Args, Clone)]
pub struct DailyArgs {
    #[command(flatten)]
    pub dir: SnapshotDirArg,

    /// Skip the QC read-back after writing.
    #[arg(long)]
    pub skip_qc: bool,

    /// Largest gap (days) between consecutive dates before QC warns.
    #[arg(long, default_value_t = DEFAULT_MAX_GAP_DAYS)]
    pub max_gap_days: i64,
}

#[derive(Debug, Args, Clone)]
pub struct LoadArgs {
    #[command(flatten)]
    pub dir: SnapshotDirArg,

    /// Analytical database file.
    #[arg(long = "db", env = "FX_DB_PATH", default_value = DEFAULT_DB_PATH)]
    pub db_path: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct QcArgs {
    #[command(flatten)]
    pub dir: SnapshotDirArg,

    /// Only check this year (default: every stored year).
    #[arg(long)]
    pub year: Option<i32>,

    /// Largest gap (days) between consecutive dates before QC warns.
    #[arg(long, default_value_t = DEFAULT_MAX_GAP_DAYS)]
    pub max_gap_days: i64,
}
