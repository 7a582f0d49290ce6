//! Errors raised by the live monitoring bus.

use thiserror::Error;

/// Errors the bus can raise.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to bind the listening socket.
    #[error("failed to bind {host}:{port}: {source}")]
    Bind {
        /// Host the bus tried to bind to.
        host: String,
        /// Port the bus tried to bind to.
        port: u16,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The background thread running the bus panicked or could not be joined.
    #[error("live bus thread did not shut down cleanly")]
    Join,
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
