//! Formatted terminal output for each command.
//!
//! Logs go to stderr; these summaries go to stdout so cron mail and scripts
//! get one compact block per run.

use crate::ingest::{BackfillSummary, IncrementalOutcome};
use crate::io::LoadSummary;
use crate::io::table::{SCHEMA_NAME, TABLE_NAME};
use crate::qc::{ContinuityReport, QcWarning};

pub fn format_backfill_summary(summary: &BackfillSummary) -> String {
    let mut out = String::new();
    out.push_str("=== fx - historical backfill ===\n");
    match (summary.years.first(), summary.years.last()) {
        (Some(first), Some(last)) => {
            out.push_str(&format!("Years: {first}..={last} ({} file(s))\n", summary.years.len()));
        }
        _ => out.push_str("Years: none\n"),
    }
    for path in &summary.files {
        out.push_str(&format!("  {}\n", path.display()));
    }
    out
}

pub fn format_incremental_outcome(outcome: &IncrementalOutcome) -> String {
    let mut out = String::new();
    out.push_str("=== fx - daily update ===\n");
    out.push_str(&format!("Range: {}\n", outcome.range));
    out.push_str(&format!("File: {}\n", outcome.path.display()));
    match &outcome.report {
        Some(report) => out.push_str(&format_continuity_report(outcome.year, report, &outcome.warnings)),
        None => out.push_str("QC: skipped\n"),
    }
    out
}

pub fn format_continuity_report(year: i32, report: &ContinuityReport, warnings: &[QcWarning]) -> String {
    let mut out = String::new();
    out.push_str(&format!("QC {year}:\n"));
    if report.is_empty {
        out.push_str("  Warning: no quotes found.\n");
    } else {
        let first = report.first_date.map(|d| d.to_string()).unwrap_or_default();
        let last = report.last_date.map(|d| d.to_string()).unwrap_or_default();
        out.push_str(&format!("  Starting date: {first}\n"));
        out.push_str(&format!("  Ending date: {last}\n"));
        out.push_str(&format!("  Observations: {}\n", report.observations));
        out.push_str(&format!("  Maximum date gap: {} day(s)", report.max_gap_days));
        if let Some((from, to)) = report.widest_gap {
            out.push_str(&format!(" ({from} -> {to})"));
        }
        out.push('\n');
    }
    for w in warnings.iter().filter(|w| **w != QcWarning::EmptySeries) {
        out.push_str(&format!("  Warning: {w}\n"));
    }
    out
}

pub fn format_load_summary(summary: &LoadSummary) -> String {
    let mut out = String::new();
    out.push_str("=== fx - table load ===\n");
    out.push_str(&format!("Database: {}\n", summary.db_path.display()));
    out.push_str(&format!("Table: {SCHEMA_NAME}.{TABLE_NAME}\n"));
    out.push_str(&format!("Loaded at (UTC): {}\n", summary.loaded_at_utc));
    out.push_str(&format!("Files: {}\n", summary.files.len()));
    for (name, rows) in &summary.files {
        out.push_str(&format!("  {name}: {rows} row(s)\n"));
    }
    let cols: Vec<String> = summary
        .columns
        .iter()
        .map(|c| format!("{} {}", c.name, c.ty.sql_type()))
        .collect();
    out.push_str(&format!("Columns: {}\n", cols.join(", ")));
    out.push_str(&format!("Rows ingested: {}\n", summary.row_count));
    out
}
