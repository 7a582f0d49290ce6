//! Hooks a monitor fires as it moves through scope and verdict transitions.

use crate::witness::Witness;

/// Callback hooks registered on a [`crate::monitor::Monitor`]. All are
/// optional: a monitor with none registered still runs correctly, just
/// silently. The manager installs these to forward verdict deltas to the
/// live-update bus.
pub struct Callbacks {
    /// Fired when the monitor's scope is entered (the activator fires, or
    /// immediately on launch for a global scope).
    pub on_enter_scope: Option<Box<dyn FnMut(f64) + Send>>,
    /// Fired when the monitor's scope closes, decided or not.
    pub on_exit_scope: Option<Box<dyn FnMut(f64) + Send>>,
    /// Fired when the monitor decides `TRUE`.
    pub on_success: Option<Box<dyn FnMut(f64, &Witness) + Send>>,
    /// Fired when the monitor decides `FALSE`.
    pub on_violation: Option<Box<dyn FnMut(f64, &Witness) + Send>>,
}

impl Default for Callbacks {
    fn default() -> Self {
        Self {
            on_enter_scope: None,
            on_exit_scope: None,
            on_success: None,
            on_violation: None,
        }
    }
}

impl Callbacks {
    /// A monitor with no callbacks registered.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn enter_scope(&mut self, t: f64) {
        if let Some(f) = &mut self.on_enter_scope {
            f(t);
        }
    }

    pub(crate) fn exit_scope(&mut self, t: f64) {
        if let Some(f) = &mut self.on_exit_scope {
            f(t);
        }
    }

    pub(crate) fn success(&mut self, t: f64, witness: &Witness) {
        if let Some(f) = &mut self.on_success {
            f(t, witness);
        }
    }

    pub(crate) fn violation(&mut self, t: f64, witness: &Witness) {
        if let Some(f) = &mut self.on_violation {
            f(t, witness);
        }
    }
}
