//! Drives a [`monitor_manager::Manager`] through a [`Trace`] at a fixed
//! tick rate, randomizing the dispatch order of messages that arrive at the
//! same instant.

use monitor_manager::Manager;
use rand::seq::SliceRandom;
use tracing::{debug, trace};

use crate::{error::Result, trace::Trace};

/// Replay `trace` against `manager`: launch at `t = 0`, dispatch timer
/// ticks and messages in monotonically increasing timestamp order (ticks
/// are interleaved with message batches, not run to completion first), and
/// shut down once the trace is exhausted.
///
/// `tick_hz` sets the timer's frequency: ticks fire at every multiple of
/// `1 / tick_hz`. Messages that share a timestamp are dispatched in a
/// randomized order, since HPL properties cannot assume an ordering among
/// logically simultaneous events.
pub fn replay(trace: &Trace, tick_hz: f64, manager: &mut Manager) -> Result<()> {
    let period = 1.0 / tick_hz;
    let mut rng = rand::thread_rng();

    manager.launch(0.0)?;
    debug!(tick_hz, monitors = manager.len(), "launched monitors for trace replay");

    let mut next_tick = period;
    for event in trace.events() {
        while next_tick < event.timestamp {
            manager.on_timer(next_tick)?;
            next_tick += period;
        }

        let mut messages = event.messages.clone();
        messages.shuffle(&mut rng);
        for message in &messages {
            trace!(topic = %message.topic, timestamp = event.timestamp, "dispatching message");
            manager.on_message(&message.topic, message, event.timestamp)?;
        }
    }

    let end = trace.events().last().map_or(0.0, |e| e.timestamp);
    while next_tick <= end {
        manager.on_timer(next_tick)?;
        next_tick += period;
    }

    manager.shutdown(end)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use hpl_ast::{
        builder::{absence, cmp, event, global, lit, property, this},
        predicate::Comparison,
        Message,
    };
    use serde_json::json;

    use super::*;
    use crate::trace::TraceEvent;

    #[test]
    fn replay_dispatches_messages_and_decides_a_violation() {
        let behaviour = event("/a", cmp(this("x"), Comparison::Lt, lit(json!(0))));
        let prop = property(global(), absence(behaviour, None), &[("id", "p0")]);
        let mut manager = Manager::build(&[prop], None).unwrap();

        let trace = Trace::from_events(vec![TraceEvent {
            timestamp: 1.0,
            messages: vec![Message::new("/a", json!({"x": -1}))],
        }]);

        replay(&trace, 5.0, &mut manager).unwrap();
        assert_eq!(manager.status_report()[0].verdict, Some(false));
    }

    #[test]
    fn replay_with_no_violation_leaves_the_verdict_undecided() {
        let behaviour = event("/a", cmp(this("x"), Comparison::Lt, lit(json!(0))));
        let prop = property(global(), absence(behaviour, None), &[("id", "p0")]);
        let mut manager = Manager::build(&[prop], None).unwrap();

        let trace = Trace::from_events(vec![TraceEvent {
            timestamp: 1.0,
            messages: vec![Message::new("/a", json!({"x": 1}))],
        }]);

        replay(&trace, 5.0, &mut manager).unwrap();
        assert_eq!(manager.status_report()[0].verdict, None);
    }
}
