//! Status-report and verdict-delta shapes shared with the live-update bus.

use serde::Serialize;
use serde_json::Value;

use monitor_runtime::Witness;

/// One monitor's entry in the status report sent as the first line to every
/// connecting live-update client.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    /// The property's `id` metadata field, or an index-derived fallback.
    pub id: String,
    /// The property's `title` metadata field, if any.
    pub title: String,
    /// The property's `description` metadata field, if any.
    pub property: String,
    /// `None` until decided, then `true`/`false`.
    pub verdict: Option<bool>,
    /// The witness that led to `verdict`, once decided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub witness: Option<Vec<WitnessEntry>>,
}

/// One message in a witness trace, as sent over the wire.
#[derive(Debug, Clone, Serialize)]
pub struct WitnessEntry {
    /// Topic the message arrived on.
    pub topic: String,
    /// Timestamp the message was dispatched at.
    pub timestamp: f64,
    /// The message's field data.
    pub message: Value,
}

/// A verdict delta, pushed to every connected client as soon as a monitor
/// decides.
#[derive(Debug, Clone, Serialize)]
pub struct VerdictEvent {
    /// Index of the monitor within the manager's ordered collection.
    #[serde(rename = "monitor")]
    pub index: usize,
    /// The property's `id` metadata field.
    pub id: String,
    /// `true` for a `TRUE` verdict, `false` for `FALSE`.
    #[serde(rename = "value")]
    pub verdict: bool,
    /// Timestamp the verdict was reached at.
    pub timestamp: f64,
    /// The witness trace that led to this verdict.
    pub witness: Vec<WitnessEntry>,
}

pub(crate) fn witness_entries(witness: &Witness) -> Vec<WitnessEntry> {
    witness
        .records()
        .iter()
        .map(|r| WitnessEntry {
            topic: r.topic.clone(),
            timestamp: r.timestamp,
            message: r.message.data.clone(),
        })
        .collect()
}
