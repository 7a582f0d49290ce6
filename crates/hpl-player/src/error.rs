//! Errors raised while replaying a trace.

use thiserror::Error;

/// Errors the trace player can raise.
#[derive(Debug, Error)]
pub enum Error {
    /// A monitor lifecycle or dispatch call failed.
    #[error(transparent)]
    Manager(#[from] monitor_manager::Error),
    /// The trace file could not be read.
    #[error("failed to read trace at {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The trace file was not valid JSON, or did not match the trace shape.
    #[error("failed to parse trace: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
