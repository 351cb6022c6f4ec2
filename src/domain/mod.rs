//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - inclusive calendar date ranges (`DateRange`)
//! - yearly provider snapshots (`RateSnapshot`)

pub mod types;

pub use types::*;
