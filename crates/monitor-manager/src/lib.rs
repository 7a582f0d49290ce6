#![warn(missing_docs)]

//! Owns the compiled set of monitors for a trace run: the topic fan-out map,
//! the shared status report, and the aggregated verdict callbacks that feed
//! the live-update bus.

pub mod error;
pub mod manager;
pub mod report;

pub use error::Error;
pub use manager::{Manager, VerdictSink};
pub use report::{MonitorStatus, VerdictEvent, WitnessEntry};

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use hpl_ast::{
        builder::{absence, cmp, event, global, lit, property, this},
        predicate::Comparison,
        Message,
    };
    use serde_json::json;

    use super::*;

    #[test]
    fn builds_monitors_and_dispatches_by_topic() {
        let behaviour = event("/a", cmp(this("x"), Comparison::Lt, lit(json!(0))));
        let prop = property(global(), absence(behaviour, None), &[("id", "p0")]);
        let mut manager = Manager::build(&[prop], None).unwrap();
        assert_eq!(manager.len(), 1);

        manager.launch(0.0).unwrap();
        manager
            .on_message("/a", &Message::new("/a", json!({"x": -1})), 1.0)
            .unwrap();

        let report = manager.status_report();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].id, "p0");
        assert_eq!(report[0].verdict, Some(false));
    }

    #[test]
    fn verdict_sink_receives_decided_events() {
        let behaviour = event("/a", cmp(this("x"), Comparison::Lt, lit(json!(0))));
        let prop = property(global(), absence(behaviour, None), &[("id", "p0")]);

        let received = Arc::new(Mutex::new(Vec::new()));
        let received_clone = Arc::clone(&received);
        let sink: VerdictSink = Arc::new(move |event: VerdictEvent| {
            received_clone.lock().unwrap().push(event);
        });

        let mut manager = Manager::build(&[prop], Some(sink)).unwrap();
        manager.launch(0.0).unwrap();
        manager
            .on_message("/a", &Message::new("/a", json!({"x": -1})), 1.0)
            .unwrap();

        let events = received.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(!events[0].verdict);
        assert_eq!(events[0].witness.len(), 1);
    }

    #[test]
    fn messages_on_unrelated_topics_are_ignored() {
        let behaviour = event("/a", cmp(this("x"), Comparison::Lt, lit(json!(0))));
        let prop = property(global(), absence(behaviour, None), &[("id", "p0")]);
        let mut manager = Manager::build(&[prop], None).unwrap();
        manager.launch(0.0).unwrap();
        manager
            .on_message("/unrelated", &Message::new("/unrelated", json!({})), 1.0)
            .unwrap();
        assert_eq!(manager.status_report()[0].verdict, None);
    }
}
