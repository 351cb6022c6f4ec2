//! `fx-rates` library crate.
//!
//! The binary (`fx`) is a thin wrapper around this library so that:
//!
//! - the fetch/QC/load pipeline is testable without spawning processes
//! - the drivers can be reused by other schedulers
//!
//! Pipeline: `data` (provider) -> `ingest` (drivers) -> `io::snapshot`
//! (yearly JSON files) -> `qc`; `io::table` loads the snapshot directory
//! into the analytical table independently.

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod io;
pub mod qc;
pub mod report;
