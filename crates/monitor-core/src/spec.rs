//! `MonitorSpec`: the immutable, shareable output of the pattern builder.

use std::{
    collections::HashMap,
    sync::Arc,
    time::Duration,
};

use hpl_ast::Predicate;

use crate::descriptor::{EventDescriptor, Verdict};

/// The state a monitor instance can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonitorState {
    /// Not running (before launch or after shutdown).
    Off,
    /// Decided true.
    True,
    /// Decided false.
    False,
    /// Scope not yet entered.
    Inactive,
    /// Scope entered, pattern pending.
    Active,
    /// Scope entered, pattern's grace/resting state.
    Safe,
}

impl MonitorState {
    /// True for `TRUE`/`FALSE`, the two terminal verdict states.
    pub fn is_terminal(self) -> bool {
        matches!(self, MonitorState::True | MonitorState::False)
    }
}

/// How many pending trigger records a monitor keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolPolicy {
    /// The pattern never pools triggers.
    None,
    /// At most `n` pending triggers are kept; older ones are evicted FIFO.
    Bounded(usize),
    /// No bound on the number of pending triggers.
    Unbounded,
}

impl Default for PoolPolicy {
    fn default() -> Self {
        PoolPolicy::None
    }
}

/// The compiled form of a property: states, timing, pooling policy, and the
/// per-`(topic, state)` event tables the runtime dispatches against.
///
/// Immutable once built; shared across monitor instances via `Arc`.
pub struct MonitorSpec {
    /// The state a freshly launched monitor starts in.
    pub initial_state: MonitorState,
    /// The pattern's timeout, if any. `None` means no timer transitions.
    pub timeout: Option<Duration>,
    /// True for `after … until …` scopes: a terminator with `Verdict::None`
    /// returns the monitor to `INACTIVE` instead of deciding anything.
    pub reentrant_scope: bool,
    /// The pool's size policy.
    pub pool_policy: PoolPolicy,
    /// True if this spec's event tables use the `SAFE` state at all.
    pub has_safe_state: bool,
    /// `on_msg[topic][state]`: ordered event descriptors tried in
    /// declaration order, first match wins.
    pub on_msg: HashMap<String, HashMap<MonitorState, Vec<EventDescriptor>>>,
    /// Per-topic predicate evaluated against a behaviour to find a matching
    /// pooled trigger (requirement pattern with cross-references).
    pub dependent_predicates: HashMap<String, Arc<dyn Predicate>>,
    /// Free-form metadata carried over from the source property.
    pub metadata: HashMap<String, String>,
    /// `(from, to, verdict)` transitions the runtime applies automatically
    /// once `t - time_state >= timeout`. `verdict` is `Some` when the
    /// transition decides the monitor; `None` for an internal move (e.g.
    /// `ACTIVE -> SAFE`) that leaves the verdict undecided.
    pub timer_transitions: Vec<(MonitorState, MonitorState, Option<Verdict>)>,
}

impl MonitorSpec {
    /// The event table for `(topic, state)`, if any.
    pub fn events_for(&self, topic: &str, state: MonitorState) -> Option<&[EventDescriptor]> {
        self.on_msg
            .get(topic)
            .and_then(|by_state| by_state.get(&state))
            .map(Vec::as_slice)
    }

    /// All topics this spec subscribes to, across every state.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.on_msg.keys().map(String::as_str)
    }
}
