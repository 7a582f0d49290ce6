//! The witness: an append-only log of the events that led to a verdict.

use hpl_ast::Message;

/// One entry in a monitor's witness log.
#[derive(Debug, Clone)]
pub struct WitnessRecord {
    /// Topic the message arrived on.
    pub topic: String,
    /// Timestamp the message was dispatched at.
    pub timestamp: f64,
    /// The message itself.
    pub message: Message,
}

/// An ordered, append-only record of firing events.
#[derive(Debug, Clone, Default)]
pub struct Witness {
    records: Vec<WitnessRecord>,
}

impl Witness {
    /// An empty witness.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.
    pub fn push(&mut self, topic: impl Into<String>, timestamp: f64, message: Message) {
        self.records.push(WitnessRecord {
            topic: topic.into(),
            timestamp,
            message,
        });
    }

    /// The full ordered record list.
    pub fn records(&self) -> &[WitnessRecord] {
        &self.records
    }

    /// The most recently appended record, if any.
    pub fn last(&self) -> Option<&WitnessRecord> {
        self.records.last()
    }

    /// Clear the witness. Only done on launch.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// True iff no records have been appended.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
