#![warn(missing_docs)]

//! Lowers `(scope, pattern)` properties into executable [`spec::MonitorSpec`]
//! values: states, a timeout, a pooling policy, and per-`(topic, state)`
//! event tables.

pub mod builder;
pub mod descriptor;
pub mod error;
pub mod spec;

pub use builder::build;
pub use descriptor::{BehaviourEffect, EventDescriptor, TriggerEffect, Verdict};
pub use error::Error;
pub use spec::{MonitorSpec, MonitorState, PoolPolicy};
