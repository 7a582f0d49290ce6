//! Errors raised while building or driving a [`crate::manager::Manager`].

use thiserror::Error;

/// Errors the manager can raise.
#[derive(Debug, Error)]
pub enum Error {
    /// A property failed to compile into a monitor spec.
    #[error("failed to build monitor: {0}")]
    Build(#[from] monitor_core::Error),
    /// A monitor's lifecycle method was misused.
    #[error("monitor lifecycle error: {0}")]
    Lifecycle(#[from] monitor_runtime::Error),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
