//! Terminal summaries for the `fx` commands.

pub mod format;

pub use format::*;
