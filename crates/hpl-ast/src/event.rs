//! Events: the things that can happen on a topic, and the disjunctions of
//! simple events an HPL event expression may denote.

use std::sync::Arc;

use crate::predicate::Predicate;

/// A single simple event: "a message arrives on `topic` satisfying
/// `predicate`", optionally captured under `alias` for later reference.
#[derive(Clone)]
pub struct SimpleEvent {
    /// Topic the event is observed on.
    pub topic: String,
    /// Predicate the arriving message must satisfy.
    pub predicate: Arc<dyn Predicate>,
    /// Optional alias this event's message is captured under.
    pub alias: Option<String>,
}

impl std::fmt::Debug for SimpleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleEvent")
            .field("topic", &self.topic)
            .field("alias", &self.alias)
            .finish()
    }
}

impl SimpleEvent {
    /// Build a simple event.
    pub fn new(topic: impl Into<String>, predicate: Arc<dyn Predicate>) -> Self {
        Self {
            topic: topic.into(),
            predicate,
            alias: None,
        }
    }

    /// Attach an alias under which the matching message is captured.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// An event expression: a disjunction of one or more simple events.
///
/// HPL allows `a or b` as a single event expression; the builder enumerates
/// over [`Event::simple_events`] to add one event-table entry per disjunct.
#[derive(Debug, Clone)]
pub struct Event {
    disjuncts: Vec<SimpleEvent>,
}

impl Event {
    /// Build an event expression from its simple-event disjuncts.
    pub fn new(disjuncts: Vec<SimpleEvent>) -> Self {
        assert!(!disjuncts.is_empty(), "event expression must have a disjunct");
        Self { disjuncts }
    }

    /// A single simple event, with no disjunction.
    pub fn simple(event: SimpleEvent) -> Self {
        Self::new(vec![event])
    }

    /// The simple events this expression denotes.
    pub fn simple_events(&self) -> &[SimpleEvent] {
        &self.disjuncts
    }

    /// True iff this is a single simple event (no `or`).
    pub fn is_simple_event(&self) -> bool {
        self.disjuncts.len() == 1
    }

    /// The alias of the (single) simple event, if any.
    pub fn alias(&self) -> Option<&str> {
        if self.disjuncts.len() == 1 {
            self.disjuncts[0].alias.as_deref()
        } else {
            None
        }
    }

    /// True iff any disjunct's predicate references `alias`.
    pub fn contains_reference(&self, alias: &str) -> bool {
        self.disjuncts.iter().any(|e| e.predicate.references(alias))
    }
}
