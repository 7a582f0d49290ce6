//! The pattern builder: lowers `(scope, pattern)` into a [`MonitorSpec`].
//!
//! Each pattern's construction rules below are transcribed from the
//! reference builder's `calc_pool_size`/`add_terminator`/`add_behaviour`/
//! `add_trigger` methods, one pattern kind per function.

use std::{collections::HashMap, sync::Arc};

use hpl_ast::{Event, Pattern, PatternKind, Predicate, Property, Scope};
use tracing::debug;

use crate::{
    descriptor::{BehaviourEffect, EventDescriptor, TriggerEffect, Verdict},
    error::{Error, Result},
    spec::{MonitorSpec, MonitorState, PoolPolicy},
};

#[derive(Default)]
struct Accum {
    on_msg: HashMap<String, HashMap<MonitorState, Vec<EventDescriptor>>>,
}

impl Accum {
    fn add(&mut self, topic: &str, state: MonitorState, descriptor: EventDescriptor) {
        self.on_msg
            .entry(topic.to_string())
            .or_default()
            .entry(state)
            .or_default()
            .push(descriptor);
    }
}

/// What a per-pattern builder function computes beyond the event tables.
struct PatternOutcome {
    pool_policy: PoolPolicy,
    has_safe_state: bool,
    dependent_predicates: HashMap<String, Arc<dyn Predicate>>,
    /// `(from, to, verdict)` automatic transitions driven by the timeout.
    timer_transitions: Vec<(MonitorState, MonitorState, Option<Verdict>)>,
}

impl Default for PatternOutcome {
    fn default() -> Self {
        Self {
            pool_policy: PoolPolicy::None,
            has_safe_state: false,
            dependent_predicates: HashMap::new(),
            timer_transitions: Vec::new(),
        }
    }
}

/// Lower `property` into an executable [`MonitorSpec`].
pub fn build(property: &Property) -> Result<MonitorSpec> {
    let pattern = &property.pattern;
    let scope = &property.scope;

    let pattern_rest_state = match pattern.kind {
        PatternKind::Absence | PatternKind::Existence | PatternKind::Requirement => {
            MonitorState::Active
        }
        PatternKind::Response | PatternKind::Prevention => MonitorState::Safe,
    };

    let mut accum = Accum::default();
    let mut initial_state = pattern_rest_state;
    let activator_alias = scope.activator().and_then(Event::alias).map(str::to_string);

    if let Some(activator) = scope.activator() {
        initial_state = MonitorState::Inactive;
        add_activator(&mut accum, activator, pattern_rest_state);
    }

    let reentrant = scope.is_reentrant();
    let alias = activator_alias.as_deref();

    let outcome = match pattern.kind {
        PatternKind::Absence => build_absence(&mut accum, pattern, scope, reentrant, alias),
        PatternKind::Existence => build_existence(&mut accum, pattern, scope, reentrant, alias),
        PatternKind::Requirement => build_requirement(&mut accum, pattern, scope, reentrant, alias)?,
        PatternKind::Response => build_response(&mut accum, pattern, scope, reentrant, alias)?,
        PatternKind::Prevention => build_prevention(&mut accum, pattern, scope, reentrant, alias)?,
    };

    debug!(
        id = %property.id(),
        pattern = ?pattern.kind,
        initial_state = ?initial_state,
        topics = accum.on_msg.len(),
        "compiled monitor spec"
    );

    Ok(MonitorSpec {
        initial_state,
        timeout: pattern.max_time,
        reentrant_scope: reentrant,
        pool_policy: outcome.pool_policy,
        has_safe_state: outcome.has_safe_state,
        on_msg: accum.on_msg,
        dependent_predicates: outcome.dependent_predicates,
        metadata: property.metadata.clone(),
        timer_transitions: outcome.timer_transitions,
    })
}

fn add_activator(accum: &mut Accum, activator: &Event, target: MonitorState) {
    for e in activator.simple_events() {
        accum.add(
            &e.topic,
            MonitorState::Inactive,
            EventDescriptor::Activator {
                predicate: e.predicate.clone(),
                alias: e.alias.clone(),
                target,
            },
        );
    }
}

fn add_terminator_single(
    accum: &mut Accum,
    terminator: &Event,
    states: &[MonitorState],
    verdict: Verdict,
    activator_alias: Option<&str>,
) {
    for e in terminator.simple_events() {
        for &state in states {
            accum.add(
                &e.topic,
                state,
                EventDescriptor::Terminator {
                    predicate: e.predicate.clone(),
                    activator_alias: activator_alias.map(str::to_string),
                    verdict,
                },
            );
        }
    }
}

fn add_terminator_per_state(
    accum: &mut Accum,
    terminator: &Event,
    verdicts: &[(MonitorState, Verdict)],
    activator_alias: Option<&str>,
) {
    for e in terminator.simple_events() {
        for &(state, verdict) in verdicts {
            accum.add(
                &e.topic,
                state,
                EventDescriptor::Terminator {
                    predicate: e.predicate.clone(),
                    activator_alias: activator_alias.map(str::to_string),
                    verdict,
                },
            );
        }
    }
}

fn add_behaviour(
    accum: &mut Accum,
    behaviour: &Event,
    states: &[MonitorState],
    activator_alias: Option<&str>,
    trigger_alias: Option<&str>,
    effect: BehaviourEffect,
) {
    for e in behaviour.simple_events() {
        for &state in states {
            accum.add(
                &e.topic,
                state,
                EventDescriptor::Behaviour {
                    predicate: e.predicate.clone(),
                    activator_alias: activator_alias.map(str::to_string),
                    trigger_alias: trigger_alias.map(str::to_string),
                    effect,
                },
            );
        }
    }
}

fn add_trigger(
    accum: &mut Accum,
    trigger: &Event,
    states: &[MonitorState],
    activator_alias: Option<&str>,
    effect: TriggerEffect,
) {
    for e in trigger.simple_events() {
        for &state in states {
            accum.add(
                &e.topic,
                state,
                EventDescriptor::Trigger {
                    predicate: e.predicate.clone(),
                    activator_alias: activator_alias.map(str::to_string),
                    effect,
                },
            );
        }
    }
}

fn build_absence(
    accum: &mut Accum,
    pattern: &Pattern,
    scope: &Scope,
    reentrant: bool,
    activator_alias: Option<&str>,
) -> PatternOutcome {
    let has_safe_state = pattern.max_time.is_some() && reentrant;
    let mut states = vec![MonitorState::Active];
    if has_safe_state {
        states.push(MonitorState::Safe);
    }
    if let Some(terminator) = scope.terminator() {
        let verdict = if reentrant { Verdict::None } else { Verdict::True };
        add_terminator_single(accum, terminator, &states, verdict, activator_alias);
    }
    add_behaviour(
        accum,
        &pattern.behaviour,
        &[MonitorState::Active],
        activator_alias,
        None,
        BehaviourEffect::Violation,
    );

    let timer_transitions = if pattern.max_time.is_some() {
        if has_safe_state {
            vec![(MonitorState::Active, MonitorState::Safe, None)]
        } else {
            vec![(MonitorState::Active, MonitorState::True, Some(Verdict::True))]
        }
    } else {
        Vec::new()
    };

    PatternOutcome {
        pool_policy: PoolPolicy::None,
        has_safe_state,
        timer_transitions,
        ..PatternOutcome::default()
    }
}

fn build_existence(
    accum: &mut Accum,
    pattern: &Pattern,
    scope: &Scope,
    reentrant: bool,
    activator_alias: Option<&str>,
) -> PatternOutcome {
    let has_safe_state = pattern.max_time.is_some() && reentrant;
    if let Some(terminator) = scope.terminator() {
        add_terminator_single(
            accum,
            terminator,
            &[MonitorState::Active],
            Verdict::False,
            activator_alias,
        );
        if reentrant {
            add_terminator_single(
                accum,
                terminator,
                &[MonitorState::Safe],
                Verdict::None,
                activator_alias,
            );
        }
    }
    add_behaviour(
        accum,
        &pattern.behaviour,
        &[MonitorState::Active],
        activator_alias,
        None,
        BehaviourEffect::Existence { to_safe: has_safe_state },
    );

    let timer_transitions = if pattern.max_time.is_some() {
        if has_safe_state {
            vec![(MonitorState::Active, MonitorState::Safe, None)]
        } else {
            vec![(MonitorState::Active, MonitorState::False, Some(Verdict::False))]
        }
    } else {
        Vec::new()
    };

    PatternOutcome {
        pool_policy: PoolPolicy::None,
        has_safe_state,
        timer_transitions,
        ..PatternOutcome::default()
    }
}

fn build_requirement(
    accum: &mut Accum,
    pattern: &Pattern,
    scope: &Scope,
    reentrant: bool,
    activator_alias: Option<&str>,
) -> Result<PatternOutcome> {
    let trigger = pattern.trigger.as_ref().ok_or(Error::MissingTrigger)?;
    let behaviour_alias = pattern.behaviour.alias();
    let has_trigger_refs = behaviour_alias
        .map(|alias| trigger.contains_reference(alias))
        .unwrap_or(false);

    let pool_policy = if has_trigger_refs {
        PoolPolicy::Unbounded
    } else if pattern.max_time.is_some() {
        PoolPolicy::Bounded(1)
    } else {
        PoolPolicy::None
    };

    let has_safe_state = (pattern.max_time.is_some() || reentrant) && !has_trigger_refs;

    if let Some(terminator) = scope.terminator() {
        let mut states = vec![MonitorState::Active];
        if has_safe_state {
            states.push(MonitorState::Safe);
        }
        let verdict = if reentrant { Verdict::None } else { Verdict::True };
        add_terminator_single(accum, terminator, &states, verdict, activator_alias);
    }

    add_behaviour(
        accum,
        &pattern.behaviour,
        &[MonitorState::Active],
        activator_alias,
        None,
        BehaviourEffect::Requirement,
    );

    let mut dependent_predicates = HashMap::new();
    let mut trigger_states = vec![MonitorState::Active];
    if has_safe_state {
        trigger_states.push(MonitorState::Safe);
    }

    if has_trigger_refs {
        let alias = behaviour_alias.expect("has_trigger_refs implies an alias");
        for e in trigger.simple_events() {
            // `residual` still speaks of "this" (the trigger) and `@alias`
            // (the behaviour). Rename "this" to the pool-candidate variable
            // first, then fold the behaviour alias into "this", so the
            // stored predicate reads naturally when evaluated with the
            // behaviour as "this" and the candidate bound under "trigger".
            let (local, residual) = e.predicate.refactor_reference(alias);
            let rewritten = residual
                .replace_this_with_var("trigger")
                .replace_var_with_this(alias);
            dependent_predicates.insert(e.topic.clone(), rewritten);
            for &state in &trigger_states {
                accum.add(
                    &e.topic,
                    state,
                    EventDescriptor::Trigger {
                        predicate: local.clone(),
                        activator_alias: activator_alias.map(str::to_string),
                        effect: TriggerEffect { enters_active: false },
                    },
                );
            }
        }
    } else {
        add_trigger(
            accum,
            trigger,
            &trigger_states,
            activator_alias,
            TriggerEffect { enters_active: false },
        );
    }

    let timer_transitions = if has_safe_state {
        vec![(MonitorState::Active, MonitorState::Safe, None)]
    } else {
        Vec::new()
    };

    Ok(PatternOutcome {
        pool_policy,
        has_safe_state,
        dependent_predicates,
        timer_transitions,
    })
}

fn build_response(
    accum: &mut Accum,
    pattern: &Pattern,
    scope: &Scope,
    reentrant: bool,
    activator_alias: Option<&str>,
) -> Result<PatternOutcome> {
    let trigger = pattern.trigger.as_ref().ok_or(Error::MissingTrigger)?;
    let trigger_alias = trigger.alias();
    let behaviour_refs_trigger = trigger_alias
        .map(|alias| pattern.behaviour.contains_reference(alias))
        .unwrap_or(false);

    let pool_policy = if behaviour_refs_trigger {
        PoolPolicy::Unbounded
    } else if pattern.max_time.is_some() {
        PoolPolicy::Bounded(1)
    } else {
        PoolPolicy::None
    };

    if let Some(terminator) = scope.terminator() {
        let safe_verdict = if reentrant { Verdict::None } else { Verdict::True };
        add_terminator_per_state(
            accum,
            terminator,
            &[
                (MonitorState::Active, Verdict::False),
                (MonitorState::Safe, safe_verdict),
            ],
            activator_alias,
        );
    }

    add_behaviour(
        accum,
        &pattern.behaviour,
        &[MonitorState::Active],
        activator_alias,
        trigger_alias,
        BehaviourEffect::Response,
    );

    let trigger_states = if pool_policy == PoolPolicy::None {
        vec![MonitorState::Safe]
    } else {
        vec![MonitorState::Safe, MonitorState::Active]
    };
    add_trigger(
        accum,
        trigger,
        &trigger_states,
        activator_alias,
        TriggerEffect { enters_active: true },
    );

    let timer_transitions = match pool_policy {
        PoolPolicy::Bounded(_) if pattern.max_time.is_some() => {
            vec![(MonitorState::Active, MonitorState::False, Some(Verdict::False))]
        }
        _ => Vec::new(),
    };

    Ok(PatternOutcome {
        pool_policy,
        has_safe_state: true,
        timer_transitions,
        ..PatternOutcome::default()
    })
}

fn build_prevention(
    accum: &mut Accum,
    pattern: &Pattern,
    scope: &Scope,
    reentrant: bool,
    activator_alias: Option<&str>,
) -> Result<PatternOutcome> {
    let trigger = pattern.trigger.as_ref().ok_or(Error::MissingTrigger)?;
    let trigger_alias = trigger.alias();
    let behaviour_refs_trigger = trigger_alias
        .map(|alias| pattern.behaviour.contains_reference(alias))
        .unwrap_or(false);

    let pool_policy = if behaviour_refs_trigger {
        PoolPolicy::Unbounded
    } else {
        PoolPolicy::Bounded(1)
    };

    if let Some(terminator) = scope.terminator() {
        let verdict = if reentrant { Verdict::None } else { Verdict::True };
        add_terminator_per_state(
            accum,
            terminator,
            &[(MonitorState::Active, verdict), (MonitorState::Safe, verdict)],
            activator_alias,
        );
    }

    add_behaviour(
        accum,
        &pattern.behaviour,
        &[MonitorState::Active],
        activator_alias,
        trigger_alias,
        BehaviourEffect::Prevention,
    );

    add_trigger(
        accum,
        trigger,
        &[MonitorState::Safe, MonitorState::Active],
        activator_alias,
        TriggerEffect { enters_active: true },
    );

    let timer_transitions = if pattern.max_time.is_some() {
        vec![(MonitorState::Active, MonitorState::Safe, None)]
    } else {
        Vec::new()
    };

    Ok(PatternOutcome {
        pool_policy,
        has_safe_state: true,
        timer_transitions,
        ..PatternOutcome::default()
    })
}
