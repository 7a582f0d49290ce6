//! The trace data model: an ordered sequence of timestamped message batches.

use hpl_ast::Message;
use serde::Deserialize;

/// Every message that arrived at a single instant.
#[derive(Debug, Clone, Deserialize)]
pub struct TraceEvent {
    /// When these messages arrived.
    pub timestamp: f64,
    /// The messages that arrived at `timestamp`, in no particular order —
    /// [`crate::replay`] is responsible for interleaving them.
    pub messages: Vec<Message>,
}

impl TraceEvent {
    /// Combine two events at the same timestamp into one. Panics if the
    /// timestamps differ; callers (`Trace::from_events`) only call this
    /// after checking.
    fn merge(&self, other: &TraceEvent) -> TraceEvent {
        assert_eq!(self.timestamp, other.timestamp, "cannot merge events at different timestamps");
        let mut messages = self.messages.clone();
        messages.extend(other.messages.iter().cloned());
        TraceEvent {
            timestamp: self.timestamp,
            messages,
        }
    }
}

/// A trace: timestamp-sorted [`TraceEvent`]s, with duplicate timestamps
/// merged on construction.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "Vec<TraceEvent>")]
pub struct Trace {
    events: Vec<TraceEvent>,
}

impl TryFrom<Vec<TraceEvent>> for Trace {
    type Error = std::convert::Infallible;

    fn try_from(events: Vec<TraceEvent>) -> Result<Self, Self::Error> {
        Ok(Trace::from_events(events))
    }
}

impl Trace {
    /// Build a trace from possibly-unsorted, possibly duplicate-timestamp
    /// events, sorting and merging as needed.
    pub fn from_events(mut events: Vec<TraceEvent>) -> Self {
        events.sort_by(|a, b| a.timestamp.partial_cmp(&b.timestamp).expect("timestamps must be finite"));
        let mut merged: Vec<TraceEvent> = Vec::with_capacity(events.len());
        for event in events {
            match merged.last_mut() {
                Some(last) if last.timestamp == event.timestamp => {
                    *last = last.merge(&event);
                }
                _ => merged.push(event),
            }
        }
        Self { events: merged }
    }

    /// The trace's events, in ascending timestamp order.
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// True iff the trace has no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The timestamp of the last event before `timestamp`, if any.
    pub fn previous_timestamp(&self, timestamp: f64) -> Option<f64> {
        self.events
            .iter()
            .rev()
            .find(|e| e.timestamp < timestamp)
            .map(|e| e.timestamp)
    }

    /// The timestamp of the first event after `timestamp`, if any.
    pub fn next_timestamp(&self, timestamp: f64) -> Option<f64> {
        self.events.iter().find(|e| e.timestamp > timestamp).map(|e| e.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn event(t: f64, topics: &[&str]) -> TraceEvent {
        TraceEvent {
            timestamp: t,
            messages: topics.iter().map(|topic| Message::new(*topic, json!({}))).collect(),
        }
    }

    #[test]
    fn events_are_sorted_by_timestamp() {
        let trace = Trace::from_events(vec![event(2.0, &["/b"]), event(1.0, &["/a"])]);
        let ts: Vec<f64> = trace.events().iter().map(|e| e.timestamp).collect();
        assert_eq!(ts, vec![1.0, 2.0]);
    }

    #[test]
    fn duplicate_timestamps_are_merged() {
        let trace = Trace::from_events(vec![event(1.0, &["/a"]), event(1.0, &["/b"])]);
        assert_eq!(trace.events().len(), 1);
        assert_eq!(trace.events()[0].messages.len(), 2);
    }

    #[test]
    fn previous_and_next_timestamp_bracket_a_point() {
        let trace = Trace::from_events(vec![event(1.0, &["/a"]), event(3.0, &["/b"])]);
        assert_eq!(trace.previous_timestamp(2.0), Some(1.0));
        assert_eq!(trace.next_timestamp(2.0), Some(3.0));
        assert_eq!(trace.previous_timestamp(0.0), None);
        assert_eq!(trace.next_timestamp(5.0), None);
    }
}
