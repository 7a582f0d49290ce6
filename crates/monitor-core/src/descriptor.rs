//! The tagged union of event descriptors a [`crate::spec::MonitorSpec`]'s
//! event tables are built from.
//!
//! Because the runtime interprets every pattern generically (there is no
//! per-property generated code), each descriptor carries enough semantic
//! detail for the interpreter to know what a match means without
//! consulting the source pattern kind.

use std::sync::Arc;

use hpl_ast::Predicate;

use crate::spec::MonitorState;

/// The decision a [`EventDescriptor::Terminator`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The property is decided true.
    True,
    /// The property is decided false.
    False,
    /// The scope closed without a decision; for reentrant scopes this
    /// returns the monitor to `INACTIVE` rather than deciding anything.
    None,
}

/// What a matching [`EventDescriptor::Behaviour`] does to the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviourEffect {
    /// Absence: the behaviour occurring is itself the violation.
    Violation,
    /// Existence: the behaviour occurring satisfies the pattern. If
    /// `to_safe` is set, move to `SAFE` (a grace window still subject to a
    /// scope terminator) instead of deciding `TRUE` outright.
    Existence {
        /// Move to `SAFE` rather than deciding `TRUE` immediately.
        to_safe: bool,
    },
    /// Requirement: the behaviour must be justified by a trigger, found
    /// either in the pool or (when `pool_size = 0`) by re-checking the
    /// dependent predicate directly. No match is a violation.
    Requirement,
    /// Response: the behaviour resolves the obligation an earlier trigger
    /// created by consuming a pooled trigger record.
    Response,
    /// Prevention: the behaviour occurring while a matching trigger is
    /// pooled is the violation; otherwise it is ignored.
    Prevention,
}

/// What recording a matching [`EventDescriptor::Trigger`] does to the
/// monitor's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerEffect {
    /// Move from `SAFE` to `ACTIVE` when the trigger is recorded (response
    /// and prevention's "a pending obligation/prohibition now exists").
    pub enters_active: bool,
}

/// One entry in a `on_msg[topic][state]` event table.
#[derive(Clone)]
pub enum EventDescriptor {
    /// Opens the scope: fires only from `INACTIVE`, transitioning to
    /// `target` (the pattern's natural resting state).
    Activator {
        /// Predicate the arriving message must satisfy.
        predicate: Arc<dyn Predicate>,
        /// Alias the matching message is captured under, if any.
        alias: Option<String>,
        /// State entered once the activator fires.
        target: MonitorState,
    },
    /// Closes the scope, carrying a verdict.
    Terminator {
        /// Predicate the arriving message must satisfy.
        predicate: Arc<dyn Predicate>,
        /// Alias of the activator's captured message, consulted if the
        /// terminator's predicate references it.
        activator_alias: Option<String>,
        /// The decision this terminator carries.
        verdict: Verdict,
    },
    /// The event the pattern is fundamentally about.
    Behaviour {
        /// Predicate the arriving message must satisfy.
        predicate: Arc<dyn Predicate>,
        /// Alias of the activator's captured message, if referenced.
        activator_alias: Option<String>,
        /// Alias of a pooled trigger's captured message, if referenced.
        trigger_alias: Option<String>,
        /// What a match does to the monitor.
        effect: BehaviourEffect,
    },
    /// An event that creates an obligation (requirement/response) or a
    /// prohibition (prevention), recorded into the pool.
    Trigger {
        /// Predicate the arriving message must satisfy.
        predicate: Arc<dyn Predicate>,
        /// Alias of the activator's captured message, if referenced.
        activator_alias: Option<String>,
        /// What recording a match does to the monitor's state.
        effect: TriggerEffect,
    },
}

impl std::fmt::Debug for EventDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventDescriptor::Activator { target, .. } => {
                f.debug_struct("Activator").field("target", target).finish()
            }
            EventDescriptor::Terminator { verdict, .. } => {
                f.debug_struct("Terminator").field("verdict", verdict).finish()
            }
            EventDescriptor::Behaviour { effect, .. } => {
                f.debug_struct("Behaviour").field("effect", effect).finish()
            }
            EventDescriptor::Trigger { effect, .. } => {
                f.debug_struct("Trigger").field("effect", effect).finish()
            }
        }
    }
}
