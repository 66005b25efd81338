//! State machine integration tests: hook ordering, previous-phase
//! tracking, and phase events.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use kartengine::events::{EventBus, EventData};
use kartengine::statemachine::{Phase, PhaseHooks, StateMachine};

fn make_machine() -> (StateMachine, Rc<EventBus>) {
    let bus = Rc::new(EventBus::new());
    (StateMachine::new(Rc::clone(&bus)), bus)
}

fn recording_hooks(phase: Phase, log: &Rc<RefCell<Vec<String>>>) -> PhaseHooks {
    let enter_log = Rc::clone(log);
    let update_log = Rc::clone(log);
    let exit_log = Rc::clone(log);
    PhaseHooks::new()
        .with_enter(move |from, _| {
            let from = from.map(|p| p.name()).unwrap_or("none");
            enter_log
                .borrow_mut()
                .push(format!("{}:enter({})", phase.name(), from));
        })
        .with_update(move |_dt| {
            update_log
                .borrow_mut()
                .push(format!("{}:update", phase.name()));
        })
        .with_exit(move || exit_log.borrow_mut().push(format!("{}:exit", phase.name())))
}

// =============================================================================
// Transitions
// =============================================================================

#[test]
fn transition_runs_exit_then_enter_exactly_once() {
    let (mut machine, _bus) = make_machine();
    let log = Rc::new(RefCell::new(Vec::new()));
    machine.register(Phase::Countdown, recording_hooks(Phase::Countdown, &log));
    machine.register(Phase::Racing, recording_hooks(Phase::Racing, &log));

    machine.transition(Phase::Countdown, None);
    assert_eq!(*log.borrow(), vec!["countdown:enter(none)"]);

    log.borrow_mut().clear();
    machine.transition(Phase::Racing, None);

    assert_eq!(*log.borrow(), vec!["countdown:exit", "racing:enter(countdown)"]);
    assert_eq!(machine.current(), Some(Phase::Racing));
}

#[test]
fn transition_to_the_current_phase_is_a_noop() {
    let (mut machine, bus) = make_machine();
    let log = Rc::new(RefCell::new(Vec::new()));
    machine.register(Phase::Racing, recording_hooks(Phase::Racing, &log));

    let events = Rc::new(RefCell::new(0u32));
    let inner = Rc::clone(&events);
    bus.subscribe(Phase::Racing.event_name(), move |_| {
        *inner.borrow_mut() += 1;
        Ok(())
    });

    machine.transition(Phase::Racing, None);
    machine.transition(Phase::Racing, None);

    assert_eq!(*log.borrow(), vec!["racing:enter(none)"]); // no re-entry
    assert_eq!(*events.borrow(), 1);
    assert_eq!(machine.current(), Some(Phase::Racing));
}

#[test]
fn previous_tracks_the_last_distinct_phase() {
    let (mut machine, _bus) = make_machine();

    assert_eq!(machine.previous(), None);

    machine.transition(Phase::Lobby, None);
    assert_eq!(machine.previous(), None);

    machine.transition(Phase::Countdown, None);
    assert_eq!(machine.previous(), Some(Phase::Lobby));

    machine.transition(Phase::Racing, None);
    assert_eq!(machine.previous(), Some(Phase::Countdown));
}

#[test]
fn pause_and_resume_restore_the_prior_phase() {
    let (mut machine, _bus) = make_machine();

    machine.transition(Phase::Racing, None);
    machine.transition(Phase::Paused, None);
    assert_eq!(machine.previous(), Some(Phase::Racing));

    let resume_target = machine.previous().unwrap();
    machine.transition(resume_target, None);

    assert_eq!(machine.current(), Some(Phase::Racing));
    assert_eq!(machine.previous(), Some(Phase::Paused));
}

// =============================================================================
// Phase events and payloads
// =============================================================================

#[test]
fn transition_publishes_the_phase_event_with_from_and_payload() {
    let (mut machine, bus) = make_machine();
    let seen = Rc::new(RefCell::new(None));

    let inner = Rc::clone(&seen);
    bus.subscribe(Phase::Racing.event_name(), move |data| {
        if let EventData::PhaseChange { from, to, data } = data {
            *inner.borrow_mut() = Some((*from, *to, data.clone()));
        }
        Ok(())
    });

    machine.transition(Phase::Countdown, None);
    machine.transition(Phase::Racing, Some(json!({ "grid": 8 })));

    let (from, to, data) = seen.borrow().clone().expect("phase event not published");
    assert_eq!(from, Some(Phase::Countdown));
    assert_eq!(to, Phase::Racing);
    assert_eq!(data, Some(json!({ "grid": 8 })));
}

#[test]
fn enter_hook_receives_the_transition_payload() {
    let (mut machine, _bus) = make_machine();
    let seen = Rc::new(RefCell::new(None));

    let inner = Rc::clone(&seen);
    machine.register(
        Phase::Results,
        PhaseHooks::new().with_enter(move |_, data| {
            *inner.borrow_mut() = data.cloned();
        }),
    );

    machine.transition(Phase::Results, Some(json!({ "winner": "kart-7" })));

    assert_eq!(*seen.borrow(), Some(json!({ "winner": "kart-7" })));
}

#[test]
fn hookless_transition_still_records_and_publishes() {
    let (mut machine, bus) = make_machine();

    let events = Rc::new(RefCell::new(0u32));
    let inner = Rc::clone(&events);
    bus.subscribe(Phase::Results.event_name(), move |_| {
        *inner.borrow_mut() += 1;
        Ok(())
    });

    machine.transition(Phase::Results, None); // no hooks registered

    assert_eq!(machine.current(), Some(Phase::Results));
    assert_eq!(*events.borrow(), 1);
}

// =============================================================================
// Updates
// =============================================================================

#[test]
fn update_delegates_to_the_current_phase_only() {
    let (mut machine, _bus) = make_machine();
    let log = Rc::new(RefCell::new(Vec::new()));
    machine.register(Phase::Lobby, recording_hooks(Phase::Lobby, &log));
    machine.register(Phase::Racing, recording_hooks(Phase::Racing, &log));

    machine.update(0.25); // no current phase: nothing runs
    assert!(log.borrow().is_empty());

    machine.transition(Phase::Racing, None);
    log.borrow_mut().clear();

    machine.update(0.25);
    machine.update(0.25);

    assert_eq!(*log.borrow(), vec!["racing:update", "racing:update"]);
}
