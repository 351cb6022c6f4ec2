//! Input/output helpers.
//!
//! - yearly JSON snapshot files (`snapshot`)
//! - snapshot -> typed rows inference (`rows`)
//! - full-refresh load into the analytical table (`table`)

pub mod rows;
pub mod snapshot;
pub mod table;

pub use snapshot::{SnapshotFile, SnapshotStore};
pub use table::{LoadSummary, TableLoader};
