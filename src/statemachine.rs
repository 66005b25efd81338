//! Game phase state machine.
//!
//! Tracks which [`Phase`] of a race session is current and runs per-phase
//! enter/update/exit hooks around transitions. The set of phases is a
//! closed enum, so a transition to an unknown phase is unrepresentable;
//! hooks are optional per phase and a hook-less transition still records
//! the change and publishes its `game:<phase>` event.

use std::fmt;
use std::rc::Rc;

use log::{debug, info};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::events::{EventBus, EventData};

/// Discrete phases of a race session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Loading,
    Lobby,
    Countdown,
    Racing,
    Results,
    Paused,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Loading,
        Phase::Lobby,
        Phase::Countdown,
        Phase::Racing,
        Phase::Results,
        Phase::Paused,
    ];

    /// Lowercase name used in logs and payloads.
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Loading => "loading",
            Phase::Lobby => "lobby",
            Phase::Countdown => "countdown",
            Phase::Racing => "racing",
            Phase::Results => "results",
            Phase::Paused => "paused",
        }
    }

    /// Bus event published when this phase becomes current.
    pub fn event_name(&self) -> &'static str {
        match self {
            Phase::Loading => "game:loading",
            Phase::Lobby => "game:lobby",
            Phase::Countdown => "game:countdown",
            Phase::Racing => "game:racing",
            Phase::Results => "game:results",
            Phase::Paused => "game:paused",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Enter/update/exit hooks for one phase. All optional.
#[derive(Default)]
pub struct PhaseHooks {
    enter: Option<Box<dyn FnMut(Option<Phase>, Option<&Value>)>>,
    update: Option<Box<dyn FnMut(f32)>>,
    exit: Option<Box<dyn FnMut()>>,
}

impl PhaseHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hook invoked when the phase becomes current; receives the previous
    /// phase and the optional transition payload.
    pub fn with_enter(mut self, f: impl FnMut(Option<Phase>, Option<&Value>) + 'static) -> Self {
        self.enter = Some(Box::new(f));
        self
    }

    /// Hook invoked once per simulation step while the phase is current.
    pub fn with_update(mut self, f: impl FnMut(f32) + 'static) -> Self {
        self.update = Some(Box::new(f));
        self
    }

    /// Hook invoked when the phase stops being current.
    pub fn with_exit(mut self, f: impl FnMut() + 'static) -> Self {
        self.exit = Some(Box::new(f));
        self
    }
}

pub struct StateMachine {
    bus: Rc<EventBus>,
    current: Option<Phase>,
    previous: Option<Phase>,
    hooks: FxHashMap<Phase, PhaseHooks>,
}

impl StateMachine {
    pub fn new(bus: Rc<EventBus>) -> Self {
        StateMachine {
            bus,
            current: None,
            previous: None,
            hooks: FxHashMap::default(),
        }
    }

    /// Register hooks for `phase`, replacing any previous registration.
    pub fn register(&mut self, phase: Phase, hooks: PhaseHooks) {
        if self.hooks.insert(phase, hooks).is_some() {
            debug!("replaced hooks for phase {}", phase);
        }
    }

    pub fn current(&self) -> Option<Phase> {
        self.current
    }

    /// Last distinct phase before the current one, for resume-after-pause.
    pub fn previous(&self) -> Option<Phase> {
        self.previous
    }

    /// Leave the current phase and enter `target`: exit hook of the old
    /// phase, then enter hook of the new one, then the `game:<phase>`
    /// event. Transitioning to the already-current phase is a no-op.
    pub fn transition(&mut self, target: Phase, data: Option<Value>) {
        if self.current == Some(target) {
            debug!("already in phase {}; ignoring transition", target);
            return;
        }
        let from = self.current;
        if let Some(phase) = from
            && let Some(hooks) = self.hooks.get_mut(&phase)
            && let Some(exit) = hooks.exit.as_mut()
        {
            exit();
        }
        self.previous = from;
        self.current = Some(target);
        match from {
            Some(phase) => info!("phase transition: {} -> {}", phase, target),
            None => info!("phase transition: (none) -> {}", target),
        }
        if let Some(hooks) = self.hooks.get_mut(&target)
            && let Some(enter) = hooks.enter.as_mut()
        {
            enter(from, data.as_ref());
        }
        self.bus.publish(
            target.event_name(),
            &EventData::PhaseChange {
                from,
                to: target,
                data,
            },
        );
    }

    /// Delegate one simulation step to the current phase's update hook.
    pub fn update(&mut self, dt: f32) {
        let Some(phase) = self.current else {
            return;
        };
        if let Some(hooks) = self.hooks.get_mut(&phase)
            && let Some(update) = hooks.update.as_mut()
        {
            update(dt);
        }
    }
}
