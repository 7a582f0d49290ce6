//! Errors raised while loading and running a set of properties.

use std::path::PathBuf;

use thiserror::Error;

/// Errors the runner can raise.
#[derive(Debug, Error)]
pub enum Error {
    /// The command line was malformed.
    #[error("usage: hpl-runner <properties.json> [trace.json]: {0}")]
    Usage(String),
    /// A file named on the command line could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The properties file was not valid JSON, or did not match the
    /// expected shape.
    #[error("failed to parse properties: {0}")]
    Parse(#[from] serde_json::Error),
    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] hpl_config::Error),
    /// A monitor could not be built or driven.
    #[error(transparent)]
    Manager(#[from] monitor_manager::Error),
    /// Trace replay failed.
    #[error(transparent)]
    Player(#[from] hpl_player::Error),
    /// The live monitoring bus could not be started.
    #[error(transparent)]
    Bus(#[from] live_bus::Error),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
