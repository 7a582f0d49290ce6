//! [`Monitor`]: a single running instance of a compiled monitor spec.
//!
//! The dispatch logic here is deliberately generic: it never branches on
//! which of the five pattern kinds produced the spec it is running, only on
//! the [`BehaviourEffect`]/`TriggerEffect` tags the builder attached to each
//! descriptor. This is what lets one state machine execute every property
//! without per-property generated code.

use std::sync::Arc;

use hpl_ast::{Bindings, Message, Predicate};
use monitor_core::{BehaviourEffect, EventDescriptor, MonitorSpec, MonitorState, PoolPolicy, Verdict};
use tracing::{debug, trace};

use crate::{
    callbacks::Callbacks,
    error::{Error, Result},
    pool::{Pool, TriggerRecord},
    witness::Witness,
};

/// A running monitor: state, bindings, pool and witness for one compiled
/// spec, plus the callbacks it reports verdicts and scope changes through.
pub struct Monitor {
    spec: Arc<MonitorSpec>,
    state: MonitorState,
    bindings: Bindings,
    pool: Pool,
    witness: Witness,
    time_entered_state: Option<f64>,
    callbacks: Callbacks,
}

impl Monitor {
    /// A fresh, not-yet-launched monitor for `spec`.
    pub fn new(spec: Arc<MonitorSpec>) -> Self {
        let pool_policy = spec.pool_policy;
        Self {
            spec,
            state: MonitorState::Off,
            bindings: Bindings::new(),
            pool: Pool::new(pool_policy),
            witness: Witness::new(),
            time_entered_state: None,
            callbacks: Callbacks::new(),
        }
    }

    /// Attach the callbacks this monitor reports through.
    pub fn with_callbacks(mut self, callbacks: Callbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// The monitor's current state.
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// The witness accumulated since launch.
    pub fn witness(&self) -> &Witness {
        &self.witness
    }

    /// Number of trigger records currently held in the pool.
    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    /// The spec this monitor is running.
    pub fn spec(&self) -> &MonitorSpec {
        &self.spec
    }

    /// Start the monitor at time `t`, resetting bindings, pool and witness.
    pub fn launch(&mut self, t: f64) -> Result<()> {
        if self.state != MonitorState::Off {
            return Err(Error::AlreadyRunning);
        }
        self.bindings.clear();
        self.pool.clear();
        self.witness.clear();
        self.state = self.spec.initial_state;
        self.time_entered_state = Some(t);
        if self.state != MonitorState::Inactive {
            self.callbacks.enter_scope(t);
        }
        Ok(())
    }

    /// Stop the monitor. No further verdict can be reached once stopped.
    pub fn shutdown(&mut self, t: f64) -> Result<()> {
        self.require_running()?;
        let _ = t;
        self.state = MonitorState::Off;
        Ok(())
    }

    fn require_running(&self) -> Result<()> {
        if self.state == MonitorState::Off {
            Err(Error::NotRunning)
        } else {
            Ok(())
        }
    }

    /// Advance the monitor's clock to `t`: ages out stale pool entries and
    /// applies the spec's automatic timer transition, if the elapsed time in
    /// the current state has reached the pattern's timeout.
    pub fn on_timer(&mut self, t: f64) -> Result<()> {
        self.require_running()?;
        if self.state.is_terminal() {
            return Ok(());
        }
        let Some(timeout) = self.spec.timeout else {
            return Ok(());
        };
        let timeout_s = timeout.as_secs_f64();

        if !matches!(self.spec.pool_policy, PoolPolicy::None) {
            self.pool.age_out(t, timeout_s);
        }

        let Some(entered) = self.time_entered_state else {
            return Ok(());
        };
        if t - entered < timeout_s {
            return Ok(());
        }

        let transition = self
            .spec
            .timer_transitions
            .iter()
            .find(|(from, _, _)| *from == self.state)
            .copied();
        if let Some((_, to, verdict)) = transition {
            match verdict {
                Some(Verdict::True) => self.decide(true, t),
                Some(Verdict::False) => self.decide(false, t),
                Some(Verdict::None) | None => self.move_to(to, t),
            }
        }
        Ok(())
    }

    /// Dispatch `message`, arrived on `topic` at time `t`, against the
    /// spec's event table for the monitor's current state. The first
    /// matching descriptor wins; later ones in the same table are not
    /// tried.
    pub fn on_message(&mut self, topic: &str, message: &Message, t: f64) -> Result<()> {
        self.require_running()?;
        if self.state.is_terminal() {
            return Ok(());
        }
        let spec = Arc::clone(&self.spec);
        let Some(events) = spec.events_for(topic, self.state) else {
            return Ok(());
        };
        for descriptor in events {
            if self.try_descriptor(descriptor, &spec, topic, message, t) {
                trace!(topic, state = ?self.state, timestamp = t, "descriptor matched");
                return Ok(());
            }
        }
        trace!(topic, state = ?self.state, timestamp = t, "no descriptor matched; spam event");
        Ok(())
    }

    fn try_descriptor(
        &mut self,
        descriptor: &EventDescriptor,
        spec: &MonitorSpec,
        topic: &str,
        message: &Message,
        t: f64,
    ) -> bool {
        match descriptor {
            EventDescriptor::Activator { predicate, alias, target } => {
                if !predicate.evaluate(message, &self.bindings).unwrap_or(false) {
                    return false;
                }
                if let Some(alias) = alias {
                    self.bindings.bind(alias.clone(), message.clone());
                }
                self.witness.push(topic, t, message.clone());
                self.pool.clear();
                self.state = *target;
                self.time_entered_state = Some(t);
                self.callbacks.enter_scope(t);
                true
            }
            EventDescriptor::Terminator { predicate, verdict, .. } => {
                if !predicate.evaluate(message, &self.bindings).unwrap_or(false) {
                    return false;
                }
                self.witness.push(topic, t, message.clone());
                match verdict {
                    Verdict::True => self.decide(true, t),
                    Verdict::False => self.decide(false, t),
                    Verdict::None => self.close_undecided(t),
                }
                true
            }
            EventDescriptor::Behaviour { predicate, trigger_alias, effect, .. } => self
                .try_behaviour(
                    predicate.as_ref(),
                    trigger_alias.as_deref(),
                    *effect,
                    spec,
                    topic,
                    message,
                    t,
                ),
            EventDescriptor::Trigger { predicate, effect, .. } => {
                if !predicate.evaluate(message, &self.bindings).unwrap_or(false) {
                    return false;
                }
                self.witness.push(topic, t, message.clone());
                self.pool.push(TriggerRecord {
                    topic: topic.to_string(),
                    timestamp: t,
                    message: message.clone(),
                    bindings: self.bindings.clone(),
                });
                if effect.enters_active && self.state == MonitorState::Safe {
                    self.state = MonitorState::Active;
                    self.time_entered_state = Some(t);
                }
                true
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn try_behaviour(
        &mut self,
        predicate: &dyn Predicate,
        trigger_alias: Option<&str>,
        effect: BehaviourEffect,
        spec: &MonitorSpec,
        topic: &str,
        message: &Message,
        t: f64,
    ) -> bool {
        match effect {
            BehaviourEffect::Violation => {
                if !predicate.evaluate(message, &self.bindings).unwrap_or(false) {
                    return false;
                }
                self.witness.push(topic, t, message.clone());
                self.decide(false, t);
                true
            }
            BehaviourEffect::Existence { to_safe } => {
                if !predicate.evaluate(message, &self.bindings).unwrap_or(false) {
                    return false;
                }
                self.witness.push(topic, t, message.clone());
                if to_safe {
                    self.move_to(MonitorState::Safe, t);
                } else {
                    self.decide(true, t);
                }
                true
            }
            BehaviourEffect::Requirement => {
                if !predicate.evaluate(message, &self.bindings).unwrap_or(false) {
                    return false;
                }
                let satisfied = match spec.dependent_predicates.get(topic) {
                    Some(dependent) => {
                        let bindings = self.bindings.clone();
                        self.pool
                            .peek_matching(|rec| {
                                let mut b = bindings.clone();
                                b.bind("trigger", rec.message.clone());
                                dependent.evaluate(message, &b).unwrap_or(false)
                            })
                            .is_some()
                    }
                    None => !self.pool.is_empty(),
                };
                self.witness.push(topic, t, message.clone());
                if !satisfied {
                    self.decide(false, t);
                }
                true
            }
            BehaviourEffect::Response => {
                let consumed = match trigger_alias {
                    Some(alias) => {
                        let bindings = self.bindings.clone();
                        self.pool.take_matching(|rec| {
                            let mut b = bindings.clone();
                            b.bind(alias, rec.message.clone());
                            predicate.evaluate(message, &b).unwrap_or(false)
                        })
                    }
                    None => {
                        if !predicate.evaluate(message, &self.bindings).unwrap_or(false) {
                            None
                        } else {
                            self.pool.take_matching(|_| true)
                        }
                    }
                };
                if consumed.is_none() {
                    return false;
                }
                self.witness.push(topic, t, message.clone());
                if self.pool.is_empty() {
                    self.move_to(MonitorState::Safe, t);
                }
                true
            }
            BehaviourEffect::Prevention => {
                let found = match trigger_alias {
                    Some(alias) => {
                        let bindings = self.bindings.clone();
                        self.pool
                            .peek_matching(|rec| {
                                let mut b = bindings.clone();
                                b.bind(alias, rec.message.clone());
                                predicate.evaluate(message, &b).unwrap_or(false)
                            })
                            .is_some()
                    }
                    None => {
                        predicate.evaluate(message, &self.bindings).unwrap_or(false)
                            && !self.pool.is_empty()
                    }
                };
                if !found {
                    return false;
                }
                self.witness.push(topic, t, message.clone());
                self.decide(false, t);
                true
            }
        }
    }

    fn move_to(&mut self, to: MonitorState, t: f64) {
        self.state = to;
        self.time_entered_state = Some(t);
    }

    fn decide(&mut self, success: bool, t: f64) {
        debug!(verdict = success, timestamp = t, witness_len = self.witness.records().len(), "monitor decided");
        self.state = if success { MonitorState::True } else { MonitorState::False };
        self.time_entered_state = Some(t);
        if success {
            self.callbacks.success(t, &self.witness);
        } else {
            self.callbacks.violation(t, &self.witness);
        }
        self.callbacks.exit_scope(t);
    }

    fn close_undecided(&mut self, t: f64) {
        self.state = MonitorState::Inactive;
        self.bindings.clear();
        self.pool.clear();
        self.time_entered_state = Some(t);
        self.callbacks.exit_scope(t);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use hpl_ast::{
        builder::{
            absence, after_until, at, cmp, event, event_as, global, lit, prevention, property,
            requirement, response, this,
        },
        predicate::Comparison,
        Message,
    };
    use serde_json::json;

    use super::*;

    #[test]
    fn launch_is_rejected_while_already_running() {
        let behaviour = event("/a", cmp(this("x"), Comparison::Lt, lit(json!(0))));
        let spec = Arc::new(monitor_core::build(&property(global(), absence(behaviour, None), &[])).unwrap());
        let mut m = Monitor::new(spec);
        m.launch(0.0).unwrap();
        assert_eq!(m.launch(1.0), Err(Error::AlreadyRunning));
    }

    #[test]
    fn messages_are_rejected_before_launch() {
        let behaviour = event("/a", cmp(this("x"), Comparison::Lt, lit(json!(0))));
        let spec = Arc::new(monitor_core::build(&property(global(), absence(behaviour, None), &[])).unwrap());
        let mut m = Monitor::new(spec);
        let msg = Message::new("/a", json!({"x": -1}));
        assert_eq!(m.on_message("/a", &msg, 0.0), Err(Error::NotRunning));
    }

    #[test]
    fn absence_violation_decides_false() {
        let behaviour = event("/a", cmp(this("x"), Comparison::Lt, lit(json!(0))));
        let spec = Arc::new(monitor_core::build(&property(global(), absence(behaviour, None), &[])).unwrap());
        let mut m = Monitor::new(spec);
        m.launch(0.0).unwrap();
        assert_eq!(m.state(), MonitorState::Active);
        m.on_message("/a", &Message::new("/a", json!({"x": -1})), 1.0).unwrap();
        assert_eq!(m.state(), MonitorState::False);
        assert_eq!(m.witness().records().len(), 1);
    }

    #[test]
    fn absence_timeout_with_no_violation_decides_true() {
        let behaviour = event("/a", cmp(this("x"), Comparison::Lt, lit(json!(0))));
        let spec = Arc::new(
            monitor_core::build(&property(
                global(),
                absence(behaviour, Some(Duration::from_secs(5))),
                &[],
            ))
            .unwrap(),
        );
        let mut m = Monitor::new(spec);
        m.launch(0.0).unwrap();
        m.on_message("/a", &Message::new("/a", json!({"x": 1})), 1.0).unwrap();
        assert_eq!(m.state(), MonitorState::Active);
        m.on_timer(5.0).unwrap();
        assert_eq!(m.state(), MonitorState::True);
    }

    #[test]
    fn response_consumes_pooled_trigger_and_returns_to_safe() {
        let trigger = event("/a", cmp(this("x"), Comparison::Gt, lit(json!(0))));
        let behaviour = event("/b", cmp(this("x"), Comparison::Gt, lit(json!(0))));
        let spec = Arc::new(
            monitor_core::build(&property(global(), response(trigger, behaviour, None), &[])).unwrap(),
        );
        let mut m = Monitor::new(spec);
        m.launch(0.0).unwrap();
        assert_eq!(m.state(), MonitorState::Safe);
        m.on_message("/a", &Message::new("/a", json!({"x": 1})), 1.0).unwrap();
        assert_eq!(m.state(), MonitorState::Active);
        m.on_message("/b", &Message::new("/b", json!({"x": 1})), 2.0).unwrap();
        assert_eq!(m.state(), MonitorState::Safe);
    }

    #[test]
    fn response_with_trigger_reference_matches_the_right_candidate() {
        let trigger = event_as("/a", cmp(this("x"), Comparison::Gt, lit(json!(0))), "T");
        let behaviour = event(
            "/b",
            cmp(this("x"), Comparison::Eq, at("T", "x")),
        );
        let spec = Arc::new(
            monitor_core::build(&property(global(), response(trigger, behaviour, None), &[])).unwrap(),
        );
        let mut m = Monitor::new(spec);
        m.launch(0.0).unwrap();
        m.on_message("/a", &Message::new("/a", json!({"x": 1})), 1.0).unwrap();
        m.on_message("/a", &Message::new("/a", json!({"x": 2})), 2.0).unwrap();
        assert_eq!(m.state(), MonitorState::Active);
        // A behaviour matching neither pooled trigger's value leaves both pending.
        m.on_message("/b", &Message::new("/b", json!({"x": 99})), 3.0).unwrap();
        assert_eq!(m.state(), MonitorState::Active);
        m.on_message("/b", &Message::new("/b", json!({"x": 1})), 4.0).unwrap();
        assert_eq!(m.state(), MonitorState::Active);
        m.on_message("/b", &Message::new("/b", json!({"x": 2})), 5.0).unwrap();
        assert_eq!(m.state(), MonitorState::Safe);
    }

    #[test]
    fn requirement_behaviour_without_prior_trigger_is_a_violation() {
        let behaviour = event_as("/b", cmp(this("x"), Comparison::Gt, lit(json!(0))), "B");
        let trigger = event("/a", cmp(this("x"), Comparison::Gt, lit(json!(0))));
        let spec = Arc::new(
            monitor_core::build(&property(global(), requirement(behaviour, trigger, None), &[])).unwrap(),
        );
        let mut m = Monitor::new(spec);
        m.launch(0.0).unwrap();
        m.on_message("/b", &Message::new("/b", json!({"x": 1})), 1.0).unwrap();
        assert_eq!(m.state(), MonitorState::False);
    }

    #[test]
    fn requirement_behaviour_after_trigger_is_not_a_violation() {
        let behaviour = event_as("/b", cmp(this("x"), Comparison::Gt, lit(json!(0))), "B");
        let trigger = event("/a", cmp(this("x"), Comparison::Gt, lit(json!(0))));
        let spec = Arc::new(
            monitor_core::build(&property(global(), requirement(behaviour, trigger, None), &[])).unwrap(),
        );
        let mut m = Monitor::new(spec);
        m.launch(0.0).unwrap();
        m.on_message("/a", &Message::new("/a", json!({"x": 1})), 1.0).unwrap();
        m.on_message("/b", &Message::new("/b", json!({"x": 1})), 2.0).unwrap();
        assert_eq!(m.state(), MonitorState::Active);
    }

    #[test]
    fn requirement_bounded_pool_ages_out_a_stale_trigger() {
        // Mirrors `globally: b {x > 0} requires a {x > 0} within 3 s`: a
        // trigger sitting in a bounded (not unbounded) pool must still decay
        // once it outlives the timeout, same as it would in an unbounded one.
        let behaviour = event_as("/b", cmp(this("x"), Comparison::Gt, lit(json!(0))), "B");
        let trigger = event("/a", cmp(this("x"), Comparison::Gt, lit(json!(0))));
        let spec = Arc::new(
            monitor_core::build(&property(
                global(),
                requirement(behaviour, trigger, Some(Duration::from_secs(3))),
                &[],
            ))
            .unwrap(),
        );
        let mut m = Monitor::new(spec);
        m.launch(0.0).unwrap();
        m.on_message("/a", &Message::new("/a", json!({"x": 1})), 1.0).unwrap();
        assert_eq!(m.pool_len(), 1);
        m.on_timer(4.0).unwrap();
        assert_eq!(m.pool_len(), 0, "a trigger older than the timeout must age out of a bounded pool too");
    }

    #[test]
    fn prevention_behaviour_while_triggered_is_a_violation() {
        let trigger = event("/a", cmp(this("x"), Comparison::Gt, lit(json!(0))));
        let behaviour = event("/b", cmp(this("x"), Comparison::Gt, lit(json!(0))));
        let spec = Arc::new(
            monitor_core::build(&property(global(), prevention(trigger, behaviour, None), &[])).unwrap(),
        );
        let mut m = Monitor::new(spec);
        m.launch(0.0).unwrap();
        assert_eq!(m.state(), MonitorState::Safe);
        m.on_message("/b", &Message::new("/b", json!({"x": 1})), 1.0).unwrap();
        assert_eq!(m.state(), MonitorState::Safe);
        m.on_message("/a", &Message::new("/a", json!({"x": 1})), 2.0).unwrap();
        assert_eq!(m.state(), MonitorState::Active);
        m.on_message("/b", &Message::new("/b", json!({"x": 1})), 3.0).unwrap();
        assert_eq!(m.state(), MonitorState::False);
    }

    #[test]
    fn prevention_with_timeout_decays_to_safe_without_a_verdict() {
        // Mirrors `globally: a {x > 0} forbids b {x > 0} within 3 s`: letting
        // the forbidding window elapse without the behaviour occurring must
        // return to SAFE, not decide a verdict.
        let trigger = event("/a", cmp(this("x"), Comparison::Gt, lit(json!(0))));
        let behaviour = event("/b", cmp(this("x"), Comparison::Gt, lit(json!(0))));
        let spec = Arc::new(
            monitor_core::build(&property(
                global(),
                prevention(trigger, behaviour, Some(Duration::from_secs(3))),
                &[],
            ))
            .unwrap(),
        );
        let mut m = Monitor::new(spec);
        m.launch(0.0).unwrap();
        m.on_message("/a", &Message::new("/a", json!({"x": 1})), 1.0).unwrap();
        assert_eq!(m.state(), MonitorState::Active);
        m.on_timer(4.0).unwrap();
        assert_eq!(m.state(), MonitorState::Safe);
    }

    #[test]
    fn reentrant_scope_closes_undecided_and_reopens() {
        let activator = event("/p", cmp(this("x"), Comparison::Eq, lit(json!(1))));
        let terminator = event("/q", cmp(this("x"), Comparison::Eq, lit(json!(1))));
        let behaviour = event("/a", cmp(this("x"), Comparison::Lt, lit(json!(0))));
        let spec = Arc::new(
            monitor_core::build(&property(
                after_until(activator, terminator),
                absence(behaviour, None),
                &[],
            ))
            .unwrap(),
        );
        let mut m = Monitor::new(spec);
        m.launch(0.0).unwrap();
        assert_eq!(m.state(), MonitorState::Inactive);
        m.on_message("/p", &Message::new("/p", json!({"x": 1})), 1.0).unwrap();
        assert_eq!(m.state(), MonitorState::Active);
        m.on_message("/q", &Message::new("/q", json!({"x": 1})), 2.0).unwrap();
        assert_eq!(m.state(), MonitorState::Inactive);
        m.on_message("/p", &Message::new("/p", json!({"x": 1})), 3.0).unwrap();
        assert_eq!(m.state(), MonitorState::Active);
    }

    #[test]
    fn callbacks_fire_on_violation() {
        use std::sync::{Arc as StdArc, Mutex};

        let behaviour = event("/a", cmp(this("x"), Comparison::Lt, lit(json!(0))));
        let spec = Arc::new(monitor_core::build(&property(global(), absence(behaviour, None), &[])).unwrap());
        let fired = StdArc::new(Mutex::new(false));
        let fired2 = StdArc::clone(&fired);
        let callbacks = Callbacks {
            on_violation: Some(Box::new(move |_t, _w| {
                *fired2.lock().unwrap() = true;
            })),
            ..Callbacks::default()
        };
        let mut m = Monitor::new(spec).with_callbacks(callbacks);
        m.launch(0.0).unwrap();
        m.on_message("/a", &Message::new("/a", json!({"x": -1})), 1.0).unwrap();
        assert!(*fired.lock().unwrap());
    }
}
