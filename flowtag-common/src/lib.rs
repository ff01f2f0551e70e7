//! Core pipeline for flowtag: tag flow log records against a
//! (destination port, protocol) lookup table and summarize the result.
//!
//! The pipeline runs in three strictly ordered stages, each handing its output
//! to the next by value:
//!
//! 1. [`lookup::LookupTable`] is loaded from a delimited table.
//! 2. [`classify`] streams flow log lines into [`classify::Aggregates`].
//! 3. [`report`] renders the aggregates.

pub mod classify;
pub mod error;
pub mod lookup;
pub mod report;
pub mod types;

/// Reexport of common types
pub use classify::{Aggregates, ClassifyStats};
pub use error::Error;
pub use lookup::LookupTable;
pub use report::ReportFormat;
pub use types::{FlowProtocol, LookupKey};

pub type Result<T> = std::result::Result<T, Error>;
