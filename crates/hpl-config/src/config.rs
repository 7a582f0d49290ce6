//! [`RuntimeConfig`]: the runner's tunable knobs, loaded from an optional
//! TOML file with a full-default fallback.

use std::{fs, path::Path};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Default host the live-update bus binds to.
pub const DEFAULT_BUS_HOST: &str = "127.0.0.1";
/// Default port the live-update bus binds to.
pub const DEFAULT_BUS_PORT: u16 = 4242;
/// Default trace-replay tick rate, in hertz.
pub const DEFAULT_TICK_HZ: f64 = 5.0;

/// The live-update bus' bind address.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BUS_HOST.to_string(),
            port: DEFAULT_BUS_PORT,
        }
    }
}

/// Diagnostic toggles independent of the ambient `tracing` subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Log every predicate evaluation error (missing field, unbound alias,
    /// type mismatch) at `warn` level. These are non-fatal — the runtime
    /// treats them as "predicate false" — but a run with unexpectedly many
    /// of them usually means a malformed property or trace.
    pub log_predicate_errors: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            log_predicate_errors: true,
        }
    }
}

/// The runner's full configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// The live-update bus' bind address.
    pub bus: BusConfig,
    /// Trace-replay tick rate, in hertz. Timer ticks fire at multiples of
    /// `1 / tick_hz`.
    pub tick_hz: f64,
    /// Diagnostic toggles.
    pub diagnostics: DiagnosticsConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            tick_hz: DEFAULT_TICK_HZ,
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load from a TOML file at `path`. Fields absent from the file fall
    /// back to their defaults; a missing file section falls back wholesale.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load_from_str(&text)
    }

    /// Parse a TOML string into a `RuntimeConfig`.
    pub fn load_from_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// The tick period implied by `tick_hz`, in seconds.
    pub fn tick_period_secs(&self) -> f64 {
        1.0 / self.tick_hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_bus_address() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.bus.host, "127.0.0.1");
        assert_eq!(cfg.bus.port, 4242);
        assert_eq!(cfg.tick_hz, 5.0);
        assert!(cfg.diagnostics.log_predicate_errors);
    }

    #[test]
    fn partial_overlay_keeps_unspecified_defaults() {
        let cfg = RuntimeConfig::load_from_str("tick_hz = 10.0\n").unwrap();
        assert_eq!(cfg.tick_hz, 10.0);
        assert_eq!(cfg.bus.port, 4242);
    }

    #[test]
    fn nested_overlay_overrides_only_given_fields() {
        let cfg = RuntimeConfig::load_from_str("[bus]\nport = 9000\n").unwrap();
        assert_eq!(cfg.bus.host, "127.0.0.1");
        assert_eq!(cfg.bus.port, 9000);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            RuntimeConfig::load_from_str("not valid = = toml"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn tick_period_is_the_reciprocal_of_the_rate() {
        let cfg = RuntimeConfig {
            tick_hz: 4.0,
            ..RuntimeConfig::default()
        };
        assert_eq!(cfg.tick_period_secs(), 0.25);
    }
}
