//! Errors raised while loading a [`crate::RuntimeConfig`].

use std::path::PathBuf;

use thiserror::Error;

/// Errors the config loader can raise.
#[derive(Debug, Error)]
pub enum Error {
    /// The config file could not be read.
    #[error("failed to read config at {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The config file's contents were not valid TOML, or did not match
    /// [`crate::RuntimeConfig`]'s shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
