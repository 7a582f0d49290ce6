#![warn(missing_docs)]

//! Executes a compiled monitor spec against a timestamped message stream.
//!
//! This crate is the interpreter half of the system: [`monitor_core`]
//! compiles a property into data (states, event tables, pooling policy);
//! [`Monitor`] is the single generic state machine that runs that data,
//! regardless of which pattern produced it.

pub mod callbacks;
pub mod error;
pub mod monitor;
pub mod pool;
pub mod witness;

pub use callbacks::Callbacks;
pub use error::Error;
pub use monitor::Monitor;
pub use pool::{Pool, TriggerRecord};
pub use witness::{Witness, WitnessRecord};
