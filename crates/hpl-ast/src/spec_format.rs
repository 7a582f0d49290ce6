//! A JSON encoding of [`Property`] values, for binaries that need to load
//! properties from a file rather than assemble them with [`crate::builder`].
//!
//! This is not a grammar for HPL's concrete syntax: it is a direct,
//! structural JSON mirror of the [`Scope`]/[`Pattern`]/[`Event`]/[`Predicate`]
//! shapes the builder already consumes, so loading a property from disk goes
//! through exactly the same constructors ([`crate::builder::cmp`],
//! [`crate::builder::event`], ...) that the synthetic builder API exposes.

use std::{collections::HashMap, sync::Arc, time::Duration};

use serde::Deserialize;
use serde_json::Value;

use crate::{
    builder,
    event::Event,
    predicate::{Comparison, FieldRef, Predicate},
    property::{Pattern, Property, Scope},
};

/// Parse one or more properties from a JSON array.
pub fn load_properties_from_str(text: &str) -> serde_json::Result<Vec<Property>> {
    let dtos: Vec<PropertyDto> = serde_json::from_str(text)?;
    Ok(dtos.into_iter().map(Property::from).collect())
}

#[derive(Debug, Deserialize)]
struct PropertyDto {
    scope: ScopeDto,
    pattern: PatternDto,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl From<PropertyDto> for Property {
    fn from(dto: PropertyDto) -> Self {
        Property {
            scope: dto.scope.into(),
            pattern: dto.pattern.into(),
            metadata: dto.metadata,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ScopeDto {
    Global,
    After { activator: EventDto },
    Until { terminator: EventDto },
    AfterUntil { activator: EventDto, terminator: EventDto },
}

impl From<ScopeDto> for Scope {
    fn from(dto: ScopeDto) -> Self {
        match dto {
            ScopeDto::Global => builder::global(),
            ScopeDto::After { activator } => builder::after(activator.into()),
            ScopeDto::Until { terminator } => builder::until(terminator.into()),
            ScopeDto::AfterUntil { activator, terminator } => {
                builder::after_until(activator.into(), terminator.into())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum PatternDto {
    Absence {
        behaviour: EventDto,
        #[serde(default)]
        max_time_secs: Option<f64>,
    },
    Existence {
        behaviour: EventDto,
        #[serde(default)]
        max_time_secs: Option<f64>,
    },
    Requirement {
        behaviour: EventDto,
        trigger: EventDto,
        #[serde(default)]
        max_time_secs: Option<f64>,
    },
    Response {
        trigger: EventDto,
        behaviour: EventDto,
        #[serde(default)]
        max_time_secs: Option<f64>,
    },
    Prevention {
        trigger: EventDto,
        behaviour: EventDto,
        #[serde(default)]
        max_time_secs: Option<f64>,
    },
}

fn as_duration(secs: Option<f64>) -> Option<Duration> {
    secs.map(Duration::from_secs_f64)
}

impl From<PatternDto> for Pattern {
    fn from(dto: PatternDto) -> Self {
        match dto {
            PatternDto::Absence { behaviour, max_time_secs } => {
                builder::absence(behaviour.into(), as_duration(max_time_secs))
            }
            PatternDto::Existence { behaviour, max_time_secs } => {
                builder::existence(behaviour.into(), as_duration(max_time_secs))
            }
            PatternDto::Requirement {
                behaviour,
                trigger,
                max_time_secs,
            } => builder::requirement(behaviour.into(), trigger.into(), as_duration(max_time_secs)),
            PatternDto::Response {
                trigger,
                behaviour,
                max_time_secs,
            } => builder::response(trigger.into(), behaviour.into(), as_duration(max_time_secs)),
            PatternDto::Prevention {
                trigger,
                behaviour,
                max_time_secs,
            } => builder::prevention(trigger.into(), behaviour.into(), as_duration(max_time_secs)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EventDto {
    topic: String,
    #[serde(default)]
    alias: Option<String>,
    #[serde(default = "PredicateDto::vacuous")]
    predicate: PredicateDto,
}

impl From<EventDto> for Event {
    fn from(dto: EventDto) -> Self {
        let predicate = Arc::<dyn Predicate>::from(dto.predicate);
        match dto.alias {
            Some(alias) => builder::event_as(dto.topic, predicate, alias),
            None => builder::event(dto.topic, predicate),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum PredicateDto {
    Vacuous,
    Cmp {
        left: FieldRefDto,
        op: ComparisonDto,
        right: FieldRefDto,
    },
    And {
        parts: Vec<PredicateDto>,
    },
    Not {
        pred: Box<PredicateDto>,
    },
}

impl PredicateDto {
    fn vacuous() -> Self {
        PredicateDto::Vacuous
    }
}

impl From<PredicateDto> for Arc<dyn Predicate> {
    fn from(dto: PredicateDto) -> Self {
        match dto {
            PredicateDto::Vacuous => builder::vacuous(),
            PredicateDto::Cmp { left, op, right } => builder::cmp(left.into(), op.into(), right.into()),
            PredicateDto::And { parts } => builder::and(parts.into_iter().map(Arc::<dyn Predicate>::from).collect()),
            PredicateDto::Not { pred } => builder::not(Arc::<dyn Predicate>::from(*pred)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ComparisonDto {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl From<ComparisonDto> for Comparison {
    fn from(dto: ComparisonDto) -> Self {
        match dto {
            ComparisonDto::Eq => Comparison::Eq,
            ComparisonDto::Ne => Comparison::Ne,
            ComparisonDto::Lt => Comparison::Lt,
            ComparisonDto::Le => Comparison::Le,
            ComparisonDto::Gt => Comparison::Gt,
            ComparisonDto::Ge => Comparison::Ge,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum FieldRefDto {
    This { field: String },
    At { alias: String, field: String },
    Lit { value: Value },
}

impl From<FieldRefDto> for FieldRef {
    fn from(dto: FieldRefDto) -> Self {
        match dto {
            FieldRefDto::This { field } => builder::this(field),
            FieldRefDto::At { alias, field } => builder::at(alias, field),
            FieldRefDto::Lit { value } => builder::lit(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn loads_a_global_absence_property() {
        let text = json!([{
            "scope": {"kind": "global"},
            "pattern": {
                "kind": "absence",
                "behaviour": {
                    "topic": "/a",
                    "predicate": {"type": "cmp", "left": {"type": "this", "field": "x"}, "op": "lt", "right": {"type": "lit", "value": 0}}
                }
            },
            "metadata": {"id": "p0", "title": "no negative x"}
        }])
        .to_string();

        let props = load_properties_from_str(&text).unwrap();
        assert_eq!(props.len(), 1);
        assert!(props[0].scope.is_global());
        assert!(props[0].pattern.is_absence());
        assert_eq!(props[0].id(), "p0");
    }

    #[test]
    fn loads_a_requirement_with_a_trigger_reference() {
        let text = json!([{
            "scope": {"kind": "global"},
            "pattern": {
                "kind": "requirement",
                "behaviour": {
                    "topic": "/b",
                    "alias": "B",
                    "predicate": {"type": "cmp", "left": {"type": "this", "field": "x"}, "op": "gt", "right": {"type": "lit", "value": 0}}
                },
                "trigger": {
                    "topic": "/a",
                    "predicate": {
                        "type": "and",
                        "parts": [
                            {"type": "cmp", "left": {"type": "this", "field": "x"}, "op": "gt", "right": {"type": "lit", "value": 0}},
                            {"type": "cmp", "left": {"type": "this", "field": "x"}, "op": "gt", "right": {"type": "at", "alias": "B", "field": "x"}}
                        ]
                    }
                },
                "max_time_secs": 3.0
            },
            "metadata": {"id": "p1"}
        }])
        .to_string();

        let props = load_properties_from_str(&text).unwrap();
        assert!(props[0].pattern.is_requirement());
        assert_eq!(props[0].pattern.max_time, Some(Duration::from_secs_f64(3.0)));
        assert!(props[0].pattern.trigger.as_ref().unwrap().contains_reference("B"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(load_properties_from_str("not json").is_err());
    }
}
