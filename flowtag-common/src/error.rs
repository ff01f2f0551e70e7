//! Error types for flowtag.

use std::{io, path::PathBuf};
use thiserror::Error;

/// All errors that can abort a flowtag run.
///
/// Malformed flow log lines are not represented here: they are skipped by the
/// classifier and never surface to the caller.
#[derive(Error, Debug)]
pub enum Error {
    /// A source could not be opened or read, or a destination could not be
    /// created or written.
    #[error("cannot access {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The lookup table does not have the expected shape.
    #[error("lookup schema error: {0}")]
    Schema(String),

    /// Rendering a JSON report failed.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn file_access(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::FileAccess {
            path: path.into(),
            source,
        }
    }
}
