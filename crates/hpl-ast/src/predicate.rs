//! The predicate surface consumed by the monitor builder.
//!
//! A predicate is an opaque boolean expression over a message's fields and a
//! set of named bindings captured from earlier events. The builder never
//! inspects a predicate's internals directly: it only calls [`Predicate`]'s
//! capability methods, which is what lets the same builder work against a
//! real HPL-parser-backed AST and against the synthetic builder in
//! [`crate::builder`].

use std::{collections::HashMap, fmt::Debug, sync::Arc};

use serde::Deserialize;
use serde_json::Value;

use crate::error::{PredicateError, Result};

/// A message captured from the event stream: a topic and its field data.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    /// Topic the message arrived on.
    pub topic: String,
    /// Field data, normally a JSON object.
    pub data: Value,
}

impl Message {
    /// Build a message from a topic and field data.
    pub fn new(topic: impl Into<String>, data: Value) -> Self {
        Self {
            topic: topic.into(),
            data,
        }
    }

    fn field(&self, name: &str) -> Result<&Value> {
        self.data
            .get(name)
            .ok_or_else(|| PredicateError::MissingField {
                topic: self.topic.clone(),
                field: name.to_string(),
            })
    }
}

/// Bindings captured for earlier aliases (e.g. the activator "P", a behaviour
/// "B"), consulted when a predicate references another event by alias.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    captured: HashMap<String, Message>,
}

impl Bindings {
    /// An empty binding environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an alias to a captured message.
    pub fn bind(&mut self, alias: impl Into<String>, msg: Message) {
        self.captured.insert(alias.into(), msg);
    }

    /// Look up a captured message by alias.
    pub fn get(&self, alias: &str) -> Option<&Message> {
        self.captured.get(alias)
    }

    /// Remove all bindings (used when a reentrant scope exits).
    pub fn clear(&mut self) {
        self.captured.clear();
    }
}

/// Capability surface a predicate implementation must provide.
///
/// Implementations are shared (`Arc`) because a single predicate object may
/// be evaluated repeatedly, from different threads, against many messages.
pub trait Predicate: Debug + Send + Sync {
    /// True for a predicate that is vacuously satisfied (the "no condition"
    /// placeholder used e.g. when a pattern has no trigger predicate).
    fn is_vacuous(&self) -> bool {
        false
    }

    /// Evaluate the predicate against `msg` under the given bindings.
    ///
    /// A missing field or unbound alias is a [`PredicateError`], which the
    /// runtime treats as "predicate false" rather than propagating.
    fn evaluate(&self, msg: &Message, bindings: &Bindings) -> Result<bool>;

    /// Split `self` with respect to `alias` into `(phi', psi)` where `phi'`
    /// is the part of the predicate independent of `alias` and `psi` is the
    /// residual constraint tying the evaluated message to the message bound
    /// to `alias`.
    fn refactor_reference(&self, alias: &str) -> (Arc<dyn Predicate>, Arc<dyn Predicate>);

    /// Rewrite every reference to the message being evaluated ("this") into
    /// a reference to the named alias instead.
    fn replace_this_with_var(&self, var: &str) -> Arc<dyn Predicate>;

    /// Rewrite every reference to `alias` into a reference to "this".
    fn replace_var_with_this(&self, alias: &str) -> Arc<dyn Predicate>;

    /// True iff the predicate mentions `alias` anywhere.
    fn references(&self, alias: &str) -> bool;
}

/// The vacuously true predicate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vacuous;

impl Predicate for Vacuous {
    fn is_vacuous(&self) -> bool {
        true
    }

    fn evaluate(&self, _msg: &Message, _bindings: &Bindings) -> Result<bool> {
        Ok(true)
    }

    fn refactor_reference(&self, _alias: &str) -> (Arc<dyn Predicate>, Arc<dyn Predicate>) {
        (Arc::new(Vacuous), Arc::new(Vacuous))
    }

    fn replace_this_with_var(&self, _var: &str) -> Arc<dyn Predicate> {
        Arc::new(Vacuous)
    }

    fn replace_var_with_this(&self, _alias: &str) -> Arc<dyn Predicate> {
        Arc::new(Vacuous)
    }

    fn references(&self, _alias: &str) -> bool {
        false
    }
}

/// Ordering/equality comparison operators for [`FieldCompare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

/// A reference to a value: a field of the message being evaluated, a field
/// of a message bound to an alias, or a literal constant.
#[derive(Debug, Clone)]
pub enum FieldRef {
    /// `field` of the message currently being evaluated.
    This(String),
    /// `field` of the message bound to `alias`.
    Alias(String, String),
    /// A literal constant.
    Literal(Value),
}

impl FieldRef {
    fn resolve(&self, msg: &Message, bindings: &Bindings) -> Result<Value> {
        match self {
            FieldRef::This(field) => msg.field(field).cloned(),
            FieldRef::Alias(alias, field) => {
                let bound = bindings
                    .get(alias)
                    .ok_or_else(|| PredicateError::UnboundAlias {
                        alias: alias.clone(),
                    })?;
                bound.field(field).cloned()
            }
            FieldRef::Literal(v) => Ok(v.clone()),
        }
    }

    fn references(&self, alias: &str) -> bool {
        matches!(self, FieldRef::Alias(a, _) if a == alias)
    }

    fn replace_this_with_var(&self, var: &str) -> FieldRef {
        match self {
            FieldRef::This(field) => FieldRef::Alias(var.to_string(), field.clone()),
            other => other.clone(),
        }
    }

    fn replace_var_with_this(&self, alias: &str) -> FieldRef {
        match self {
            FieldRef::Alias(a, field) if a == alias => FieldRef::This(field.clone()),
            other => other.clone(),
        }
    }
}

fn compare_values(left: &Value, op: Comparison, right: &Value) -> Result<bool> {
    if let (Some(l), Some(r)) = (left.as_f64(), right.as_f64()) {
        return Ok(match op {
            Comparison::Eq => l == r,
            Comparison::Ne => l != r,
            Comparison::Lt => l < r,
            Comparison::Le => l <= r,
            Comparison::Gt => l > r,
            Comparison::Ge => l >= r,
        });
    }
    match op {
        Comparison::Eq => Ok(left == right),
        Comparison::Ne => Ok(left != right),
        _ => Err(PredicateError::TypeMismatch {
            left: left.to_string(),
            right: right.to_string(),
        }),
    }
}

/// A leaf predicate comparing two field references.
#[derive(Debug, Clone)]
pub struct FieldCompare {
    /// Left-hand operand.
    pub left: FieldRef,
    /// Comparison operator.
    pub op: Comparison,
    /// Right-hand operand.
    pub right: FieldRef,
}

impl FieldCompare {
    /// Build a new field comparison.
    pub fn new(left: FieldRef, op: Comparison, right: FieldRef) -> Self {
        Self { left, op, right }
    }
}

impl Predicate for FieldCompare {
    fn evaluate(&self, msg: &Message, bindings: &Bindings) -> Result<bool> {
        let l = self.left.resolve(msg, bindings)?;
        let r = self.right.resolve(msg, bindings)?;
        compare_values(&l, self.op, &r)
    }

    fn refactor_reference(&self, alias: &str) -> (Arc<dyn Predicate>, Arc<dyn Predicate>) {
        if self.references(alias) {
            (Arc::new(Vacuous), Arc::new(self.clone()))
        } else {
            (Arc::new(self.clone()), Arc::new(Vacuous))
        }
    }

    fn replace_this_with_var(&self, var: &str) -> Arc<dyn Predicate> {
        Arc::new(FieldCompare::new(
            self.left.replace_this_with_var(var),
            self.op,
            self.right.replace_this_with_var(var),
        ))
    }

    fn replace_var_with_this(&self, alias: &str) -> Arc<dyn Predicate> {
        Arc::new(FieldCompare::new(
            self.left.replace_var_with_this(alias),
            self.op,
            self.right.replace_var_with_this(alias),
        ))
    }

    fn references(&self, alias: &str) -> bool {
        self.left.references(alias) || self.right.references(alias)
    }
}

/// Logical conjunction of sub-predicates.
#[derive(Debug, Clone)]
pub struct And(pub Vec<Arc<dyn Predicate>>);

impl Predicate for And {
    fn evaluate(&self, msg: &Message, bindings: &Bindings) -> Result<bool> {
        for p in &self.0 {
            if !p.evaluate(msg, bindings)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn refactor_reference(&self, alias: &str) -> (Arc<dyn Predicate>, Arc<dyn Predicate>) {
        let mut local = Vec::new();
        let mut residual = Vec::new();
        for p in &self.0 {
            let (phi, psi) = p.refactor_reference(alias);
            if !phi.is_vacuous() {
                local.push(phi);
            }
            if !psi.is_vacuous() {
                residual.push(psi);
            }
        }
        (conjunction(local), conjunction(residual))
    }

    fn replace_this_with_var(&self, var: &str) -> Arc<dyn Predicate> {
        Arc::new(And(
            self.0.iter().map(|p| p.replace_this_with_var(var)).collect(),
        ))
    }

    fn replace_var_with_this(&self, alias: &str) -> Arc<dyn Predicate> {
        Arc::new(And(
            self.0.iter().map(|p| p.replace_var_with_this(alias)).collect(),
        ))
    }

    fn references(&self, alias: &str) -> bool {
        self.0.iter().any(|p| p.references(alias))
    }
}

/// Build a conjunction, collapsing the degenerate 0-/1-element cases.
fn conjunction(mut parts: Vec<Arc<dyn Predicate>>) -> Arc<dyn Predicate> {
    match parts.len() {
        0 => Arc::new(Vacuous),
        1 => parts.remove(0),
        _ => Arc::new(And(parts)),
    }
}

/// Logical negation of a sub-predicate.
#[derive(Debug, Clone)]
pub struct Not(pub Arc<dyn Predicate>);

impl Predicate for Not {
    fn evaluate(&self, msg: &Message, bindings: &Bindings) -> Result<bool> {
        Ok(!self.0.evaluate(msg, bindings)?)
    }

    fn refactor_reference(&self, alias: &str) -> (Arc<dyn Predicate>, Arc<dyn Predicate>) {
        if self.references(alias) {
            (Arc::new(Vacuous), Arc::new(self.clone()))
        } else {
            (Arc::new(self.clone()), Arc::new(Vacuous))
        }
    }

    fn replace_this_with_var(&self, var: &str) -> Arc<dyn Predicate> {
        Arc::new(Not(self.0.replace_this_with_var(var)))
    }

    fn replace_var_with_this(&self, alias: &str) -> Arc<dyn Predicate> {
        Arc::new(Not(self.0.replace_var_with_this(alias)))
    }

    fn references(&self, alias: &str) -> bool {
        self.0.references(alias)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn vacuous_is_always_true() {
        let msg = Message::new("/a", json!({}));
        let bindings = Bindings::new();
        assert!(Vacuous.evaluate(&msg, &bindings).unwrap());
        assert!(Vacuous.is_vacuous());
    }

    #[test]
    fn field_compare_against_literal() {
        let pred = FieldCompare::new(
            FieldRef::This("x".into()),
            Comparison::Lt,
            FieldRef::Literal(json!(0)),
        );
        let neg = Message::new("/a", json!({"x": -1}));
        let pos = Message::new("/a", json!({"x": 1}));
        let bindings = Bindings::new();
        assert!(pred.evaluate(&neg, &bindings).unwrap());
        assert!(!pred.evaluate(&pos, &bindings).unwrap());
    }

    #[test]
    fn missing_field_is_an_error() {
        let pred = FieldCompare::new(
            FieldRef::This("x".into()),
            Comparison::Gt,
            FieldRef::Literal(json!(0)),
        );
        let msg = Message::new("/a", json!({}));
        let bindings = Bindings::new();
        assert!(matches!(
            pred.evaluate(&msg, &bindings),
            Err(PredicateError::MissingField { .. })
        ));
    }

    #[test]
    fn refactor_reference_splits_alias_dependent_conjuncts() {
        let local = FieldCompare::new(
            FieldRef::This("x".into()),
            Comparison::Gt,
            FieldRef::Literal(json!(0)),
        );
        let dependent = FieldCompare::new(
            FieldRef::This("x".into()),
            Comparison::Gt,
            FieldRef::Alias("b".into(), "x".into()),
        );
        let combined: Arc<dyn Predicate> =
            Arc::new(And(vec![Arc::new(local.clone()), Arc::new(dependent.clone())]));
        let (phi, psi) = combined.refactor_reference("b");
        assert!(!phi.references("b"));
        assert!(psi.references("b"));

        let msg = Message::new("/a", json!({"x": 5}));
        let bindings = Bindings::new();
        assert!(phi.evaluate(&msg, &bindings).unwrap());
    }

    #[test]
    fn this_var_substitution_round_trips() {
        let pred = FieldCompare::new(
            FieldRef::This("x".into()),
            Comparison::Gt,
            FieldRef::Literal(json!(0)),
        );
        let as_var = pred.replace_this_with_var("t");
        let back = as_var.replace_var_with_this("t");
        let msg = Message::new("/a", json!({"x": 1}));
        let bindings = Bindings::new();
        assert!(back.evaluate(&msg, &bindings).unwrap());
    }
}
