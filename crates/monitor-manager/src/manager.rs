//! [`Manager`]: owns the compiled set of monitors for a trace run.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use hpl_ast::{Message, Property};
use monitor_runtime::{Callbacks, Monitor};
use tracing::{debug, trace};

use crate::{
    error::Result,
    report::{witness_entries, MonitorStatus, VerdictEvent},
};

/// Called with every verdict a monitor reaches, in the order reached. The
/// manager uses this to forward deltas to the live-update bus; tests can
/// register a simpler sink to assert on verdicts directly.
pub type VerdictSink = Arc<dyn Fn(VerdictEvent) + Send + Sync>;

struct Entry {
    monitor: Monitor,
}

/// Owns an ordered collection of monitors compiled from a set of properties,
/// the topic-to-monitor-index fan-out map, and the shared status report the
/// live-update bus serves to newly connected clients.
pub struct Manager {
    entries: Vec<Entry>,
    topics: HashMap<String, Vec<usize>>,
    status: Arc<Mutex<Vec<MonitorStatus>>>,
}

impl Manager {
    /// Compile `properties` into monitors. `sink`, if given, is called with
    /// every verdict as monitors reach them.
    pub fn build(properties: &[Property], sink: Option<VerdictSink>) -> Result<Self> {
        let status = Arc::new(Mutex::new(Vec::with_capacity(properties.len())));
        let mut entries = Vec::with_capacity(properties.len());
        let mut topics: HashMap<String, Vec<usize>> = HashMap::new();

        for (index, property) in properties.iter().enumerate() {
            let id = if property.id().is_empty() {
                format!("property-{index}")
            } else {
                property.id().to_string()
            };
            let title = property.title().to_string();

            status.lock().unwrap().push(MonitorStatus {
                id: id.clone(),
                title: title.clone(),
                property: property.description().to_string(),
                verdict: None,
                witness: None,
            });

            let spec = Arc::new(monitor_core::build(property)?);
            for topic in spec.topics() {
                topics.entry(topic.to_string()).or_default().push(index);
            }

            let callbacks = Self::callbacks_for(index, id.clone(), Arc::clone(&status), sink.clone());
            let monitor = Monitor::new(spec).with_callbacks(callbacks);
            entries.push(Entry { monitor });

            debug!(id = %id, title = %title, "compiled monitor");
        }

        Ok(Self { entries, topics, status })
    }

    fn callbacks_for(
        index: usize,
        id: String,
        status: Arc<Mutex<Vec<MonitorStatus>>>,
        sink: Option<VerdictSink>,
    ) -> Callbacks {
        let success_status = Arc::clone(&status);
        let success_id = id.clone();
        let success_sink = sink.clone();
        let violation_status = status;
        let violation_id = id;
        let violation_sink = sink;

        Callbacks {
            on_success: Some(Box::new(move |t, witness| {
                let entries = witness_entries(witness);
                {
                    let mut status = success_status.lock().unwrap();
                    status[index].verdict = Some(true);
                    status[index].witness = Some(entries.clone());
                }
                if let Some(sink) = &success_sink {
                    sink(VerdictEvent {
                        index,
                        id: success_id.clone(),
                        verdict: true,
                        timestamp: t,
                        witness: entries,
                    });
                }
            })),
            on_violation: Some(Box::new(move |t, witness| {
                let entries = witness_entries(witness);
                {
                    let mut status = violation_status.lock().unwrap();
                    status[index].verdict = Some(false);
                    status[index].witness = Some(entries.clone());
                }
                if let Some(sink) = &violation_sink {
                    sink(VerdictEvent {
                        index,
                        id: violation_id.clone(),
                        verdict: false,
                        timestamp: t,
                        witness: entries,
                    });
                }
            })),
            ..Callbacks::default()
        }
    }

    /// Launch every monitor at time `t`.
    pub fn launch(&mut self, t: f64) -> Result<()> {
        for entry in &mut self.entries {
            entry.monitor.launch(t)?;
        }
        Ok(())
    }

    /// Shut down every monitor at time `t`.
    pub fn shutdown(&mut self, t: f64) -> Result<()> {
        for entry in &mut self.entries {
            entry.monitor.shutdown(t)?;
        }
        Ok(())
    }

    /// Advance every monitor's clock to `t`.
    pub fn on_timer(&mut self, t: f64) -> Result<()> {
        for entry in &mut self.entries {
            entry.monitor.on_timer(t)?;
        }
        Ok(())
    }

    /// Dispatch `message`, arrived on `topic` at time `t`, to every monitor
    /// subscribed to that topic.
    pub fn on_message(&mut self, topic: &str, message: &Message, t: f64) -> Result<()> {
        let Some(indices) = self.topics.get(topic) else {
            trace!(topic, "no monitor subscribes to this topic");
            return Ok(());
        };
        for &index in indices {
            self.entries[index].monitor.on_message(topic, message, t)?;
        }
        Ok(())
    }

    /// A snapshot of every monitor's current status.
    pub fn status_report(&self) -> Vec<MonitorStatus> {
        self.status.lock().unwrap().clone()
    }

    /// Number of monitors under management.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True iff no monitors are under management.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
