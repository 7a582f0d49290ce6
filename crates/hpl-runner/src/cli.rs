//! Minimal positional argument parsing: no argument-parsing framework, since
//! this binary's whole feature surface is two file paths.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// The runner's command-line input: a properties file and an optional trace
/// file to replay against the monitors it builds.
pub struct Args {
    /// Path to a JSON file holding one or more properties.
    pub properties_path: PathBuf,
    /// Path to a JSON trace file, if a replay should run.
    pub trace_path: Option<PathBuf>,
}

/// Parse `argv` (excluding the program name) into [`Args`].
pub fn parse(argv: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut positional = argv.into_iter();
    let properties_path = positional
        .next()
        .ok_or_else(|| Error::Usage("missing path to a properties file".to_string()))?
        .into();
    let trace_path = positional.next().map(PathBuf::from);
    Ok(Args {
        properties_path,
        trace_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_properties_path_alone() {
        let args = parse(["props.json".to_string()]).unwrap();
        assert_eq!(args.properties_path, PathBuf::from("props.json"));
        assert!(args.trace_path.is_none());
    }

    #[test]
    fn parses_a_properties_path_and_a_trace_path() {
        let args = parse(["props.json".to_string(), "trace.json".to_string()]).unwrap();
        assert_eq!(args.trace_path, Some(PathBuf::from("trace.json")));
    }

    #[test]
    fn missing_properties_path_is_a_usage_error() {
        assert!(matches!(parse(std::iter::empty()), Err(Error::Usage(_))));
    }
}
