#![warn(missing_docs)]

//! A TCP server that streams monitor status and verdicts to connected
//! clients: one compact JSON status-report line on connect, then one
//! compact JSON verdict line per decided monitor.

mod error;
mod server;

pub use error::Error;
pub use server::{LiveBus, LiveBusHandle};
