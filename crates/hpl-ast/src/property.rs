//! Scope, pattern, and property: the three levels the builder consumes.

use std::{collections::HashMap, time::Duration};

use crate::event::Event;

/// The temporal window during which a pattern is evaluated.
#[derive(Debug, Clone)]
pub enum Scope {
    /// The pattern holds over the entire trace.
    Global,
    /// The pattern holds from the first occurrence of `activator` onward.
    After(Event),
    /// The pattern holds until the first occurrence of `terminator`.
    Until(Event),
    /// The pattern holds between an `activator` and a `terminator`, and may
    /// re-open after the terminator (a reentrant scope).
    AfterUntil {
        /// Event that opens the scope.
        activator: Event,
        /// Event that closes the scope.
        terminator: Event,
    },
}

impl Scope {
    /// True for [`Scope::Global`].
    pub fn is_global(&self) -> bool {
        matches!(self, Scope::Global)
    }

    /// True for [`Scope::After`].
    pub fn is_after(&self) -> bool {
        matches!(self, Scope::After(_))
    }

    /// True for [`Scope::Until`].
    pub fn is_until(&self) -> bool {
        matches!(self, Scope::Until(_))
    }

    /// True for [`Scope::AfterUntil`].
    pub fn is_after_until(&self) -> bool {
        matches!(self, Scope::AfterUntil { .. })
    }

    /// The event that opens the scope, if any.
    pub fn activator(&self) -> Option<&Event> {
        match self {
            Scope::After(e) | Scope::AfterUntil { activator: e, .. } => Some(e),
            Scope::Global | Scope::Until(_) => None,
        }
    }

    /// The event that closes the scope, if any.
    pub fn terminator(&self) -> Option<&Event> {
        match self {
            Scope::Until(e) | Scope::AfterUntil { terminator: e, .. } => Some(e),
            Scope::Global | Scope::After(_) => None,
        }
    }

    /// True for scopes that can re-open after being exited (`after … until
    /// …`): the only reentrant scope shape.
    pub fn is_reentrant(&self) -> bool {
        self.is_after_until()
    }
}

/// The shape of a property: what relationship it asserts between events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// `behaviour` never occurs.
    Absence,
    /// `behaviour` occurs at least once.
    Existence,
    /// `behaviour` requires a prior `trigger`.
    Requirement,
    /// `trigger` causes a subsequent `behaviour`.
    Response,
    /// `trigger` forbids a subsequent `behaviour`.
    Prevention,
}

/// A pattern: its kind, the behaviour it is about, an optional trigger, and
/// an optional timeout.
#[derive(Debug, Clone)]
pub struct Pattern {
    /// Which of the five pattern shapes this is.
    pub kind: PatternKind,
    /// The event the pattern is fundamentally about.
    pub behaviour: Event,
    /// The triggering/requiring event, for requirement/response/prevention.
    pub trigger: Option<Event>,
    /// Maximum time allowed for the pattern to be decided, if any.
    pub max_time: Option<Duration>,
}

impl Pattern {
    /// True for [`PatternKind::Absence`].
    pub fn is_absence(&self) -> bool {
        self.kind == PatternKind::Absence
    }

    /// True for [`PatternKind::Existence`].
    pub fn is_existence(&self) -> bool {
        self.kind == PatternKind::Existence
    }

    /// True for [`PatternKind::Requirement`].
    pub fn is_requirement(&self) -> bool {
        self.kind == PatternKind::Requirement
    }

    /// True for [`PatternKind::Response`].
    pub fn is_response(&self) -> bool {
        self.kind == PatternKind::Response
    }

    /// True for [`PatternKind::Prevention`].
    pub fn is_prevention(&self) -> bool {
        self.kind == PatternKind::Prevention
    }
}

/// A full property: scope, pattern, and free-form metadata (id, title,
/// description, original source text).
#[derive(Debug, Clone)]
pub struct Property {
    /// The scope the pattern is evaluated within.
    pub scope: Scope,
    /// The pattern itself.
    pub pattern: Pattern,
    /// Free-form metadata, e.g. `id`, `title`, `description`.
    pub metadata: HashMap<String, String>,
}

impl Property {
    /// A convenience accessor for `metadata["id"]`.
    pub fn id(&self) -> &str {
        self.metadata.get("id").map(String::as_str).unwrap_or("")
    }

    /// A convenience accessor for `metadata["title"]`.
    pub fn title(&self) -> &str {
        self.metadata.get("title").map(String::as_str).unwrap_or("")
    }

    /// A convenience accessor for `metadata["description"]`: free-form text
    /// describing the property, shown alongside its verdict in a status
    /// report.
    pub fn description(&self) -> &str {
        self.metadata.get("description").map(String::as_str).unwrap_or("")
    }
}
