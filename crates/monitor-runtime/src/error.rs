//! Runtime lifecycle and evaluation errors.

use thiserror::Error;

/// Errors raised by a monitor's lifecycle operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// `launch` was called on a monitor that is already running.
    #[error("monitor is already running")]
    AlreadyRunning,
    /// `shutdown` or `on_timer`/`on_message` was called on a monitor that
    /// is not running.
    #[error("monitor is not running")]
    NotRunning,
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
