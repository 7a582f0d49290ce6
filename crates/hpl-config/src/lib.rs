#![warn(missing_docs)]

//! Loads the runner's configuration: the live-update bus address, the
//! trace-replay tick rate, and diagnostic toggles.

mod config;
mod error;

pub use config::{
    BusConfig, DiagnosticsConfig, RuntimeConfig, DEFAULT_BUS_HOST, DEFAULT_BUS_PORT, DEFAULT_TICK_HZ,
};
pub use error::Error;
