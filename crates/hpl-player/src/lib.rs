#![warn(missing_docs)]

//! Replays a timestamped message trace against a compiled set of monitors,
//! driving their `launch`/`on_timer`/`on_message`/`shutdown` lifecycle at a
//! fixed tick rate.

pub mod error;
pub mod replay;
pub mod trace;

use std::{fs, path::Path};

pub use error::Error;
pub use replay::replay;
pub use trace::{Trace, TraceEvent};

impl Trace {
    /// Load a trace from a JSON file: an array of `{timestamp, messages}`
    /// objects, each message a `{topic, data}` object.
    pub fn load_from_path(path: &Path) -> error::Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}
