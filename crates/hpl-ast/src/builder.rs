//! A synthetic constructor API for assembling [`Property`] values directly
//! in Rust, without a text grammar.
//!
//! This is not a parser for HPL's concrete syntax — it exists so tests, the
//! trace player, and anything else that wants to exercise the monitor
//! synthesis pipeline can build properties programmatically.

use std::{sync::Arc, time::Duration};

use serde_json::Value;

use crate::{
    event::{Event, SimpleEvent},
    predicate::{And, Comparison, FieldCompare, FieldRef, Not, Predicate, Vacuous},
    property::{Pattern, PatternKind, Property, Scope},
};

/// A field of the message currently being evaluated.
pub fn this(field: impl Into<String>) -> FieldRef {
    FieldRef::This(field.into())
}

/// A field of the message captured under `alias`.
pub fn at(alias: impl Into<String>, field: impl Into<String>) -> FieldRef {
    FieldRef::Alias(alias.into(), field.into())
}

/// A literal constant value.
pub fn lit(value: impl Into<Value>) -> FieldRef {
    FieldRef::Literal(value.into())
}

/// Build a field comparison predicate.
pub fn cmp(left: FieldRef, op: Comparison, right: FieldRef) -> Arc<dyn Predicate> {
    Arc::new(FieldCompare::new(left, op, right))
}

/// The vacuously true predicate.
pub fn vacuous() -> Arc<dyn Predicate> {
    Arc::new(Vacuous)
}

/// Logical conjunction.
pub fn and(parts: Vec<Arc<dyn Predicate>>) -> Arc<dyn Predicate> {
    Arc::new(And(parts))
}

/// Logical negation.
pub fn not(pred: Arc<dyn Predicate>) -> Arc<dyn Predicate> {
    Arc::new(Not(pred))
}

/// A simple event on `topic` whose message must satisfy `predicate`.
pub fn event(topic: impl Into<String>, predicate: Arc<dyn Predicate>) -> Event {
    Event::simple(SimpleEvent::new(topic, predicate))
}

/// As [`event`], capturing the matching message under `alias`.
pub fn event_as(topic: impl Into<String>, predicate: Arc<dyn Predicate>, alias: impl Into<String>) -> Event {
    Event::simple(SimpleEvent::new(topic, predicate).with_alias(alias))
}

/// The `global` scope.
pub fn global() -> Scope {
    Scope::Global
}

/// The `after activator` scope.
pub fn after(activator: Event) -> Scope {
    Scope::After(activator)
}

/// The `until terminator` scope.
pub fn until(terminator: Event) -> Scope {
    Scope::Until(terminator)
}

/// The `after activator until terminator` scope.
pub fn after_until(activator: Event, terminator: Event) -> Scope {
    Scope::AfterUntil {
        activator,
        terminator,
    }
}

/// `globally: no behaviour [within max_time]`.
pub fn absence(behaviour: Event, max_time: Option<Duration>) -> Pattern {
    Pattern {
        kind: PatternKind::Absence,
        behaviour,
        trigger: None,
        max_time,
    }
}

/// `globally: some behaviour [within max_time]`.
pub fn existence(behaviour: Event, max_time: Option<Duration>) -> Pattern {
    Pattern {
        kind: PatternKind::Existence,
        behaviour,
        trigger: None,
        max_time,
    }
}

/// `behaviour requires trigger [within max_time]`.
pub fn requirement(behaviour: Event, trigger: Event, max_time: Option<Duration>) -> Pattern {
    Pattern {
        kind: PatternKind::Requirement,
        behaviour,
        trigger: Some(trigger),
        max_time,
    }
}

/// `trigger causes behaviour [within max_time]`.
pub fn response(trigger: Event, behaviour: Event, max_time: Option<Duration>) -> Pattern {
    Pattern {
        kind: PatternKind::Response,
        behaviour,
        trigger: Some(trigger),
        max_time,
    }
}

/// `trigger forbids behaviour [within max_time]`.
pub fn prevention(trigger: Event, behaviour: Event, max_time: Option<Duration>) -> Pattern {
    Pattern {
        kind: PatternKind::Prevention,
        behaviour,
        trigger: Some(trigger),
        max_time,
    }
}

/// Build a property from a scope, a pattern, and `(key, value)` metadata
/// pairs.
pub fn property(scope: Scope, pattern: Pattern, metadata: &[(&str, &str)]) -> Property {
    Property {
        scope,
        pattern,
        metadata: metadata
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn builds_a_global_absence_property() {
        let behaviour = event("/a", cmp(this("x"), Comparison::Lt, lit(json!(0))));
        let pattern = absence(behaviour, None);
        let prop = property(global(), pattern, &[("id", "p0")]);
        assert!(prop.scope.is_global());
        assert!(prop.pattern.is_absence());
        assert_eq!(prop.id(), "p0");
    }
}
