//! Engine orchestrator.
//!
//! Owns one [`GameLoop`] and one [`StateMachine`], keeps a registry of
//! named [`System`]s, and wires the loop's events to them over the bus:
//! every `loop:update` advances the state machine and then calls
//! `update(dt, time)` on each system in registration order; every
//! `loop:render` calls `render(dt, interpolation)` the same way.
//!
//! Systems never see the bus wiring; they only implement the hooks they
//! care about. The system registry must not be mutated from inside a tick
//! (registration normally happens before `start()`).

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::events::{names, EventBus, EventData, ListenerId};
use crate::gameloop::GameLoop;
use crate::statemachine::{Phase, StateMachine};

/// A named engine subsystem driven by the loop's events.
///
/// Every hook defaults to a no-op; a system implements only the
/// capabilities it has. `init` runs during [`Engine::init`] (or
/// immediately when registered on an initialized engine) and its failure
/// aborts startup.
pub trait System {
    fn init(&mut self) -> Result<(), String> {
        Ok(())
    }

    /// One fixed simulation step.
    fn update(&mut self, _dt: f32, _time: f64) {}

    /// One render pass; `interpolation` is the fractional progress toward
    /// the next simulation step.
    fn render(&mut self, _dt: f32, _interpolation: f32) {}

    fn destroy(&mut self) {}
}

struct NamedSystem {
    name: String,
    system: Box<dyn System>,
}

/// Registration-ordered system registry. Order is part of the contract:
/// initialization and per-tick dispatch both follow it.
#[derive(Default)]
struct SystemRegistry {
    systems: Vec<NamedSystem>,
}

impl SystemRegistry {
    fn contains(&self, name: &str) -> bool {
        self.systems.iter().any(|entry| entry.name == name)
    }

    fn push(&mut self, name: String, system: Box<dyn System>) {
        self.systems.push(NamedSystem { name, system });
    }

    fn remove(&mut self, name: &str) -> Option<Box<dyn System>> {
        let index = self.systems.iter().position(|entry| entry.name == name)?;
        Some(self.systems.remove(index).system)
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut NamedSystem> {
        self.systems.iter_mut()
    }

    fn drain(&mut self) -> Vec<NamedSystem> {
        std::mem::take(&mut self.systems)
    }

    fn len(&self) -> usize {
        self.systems.len()
    }
}

pub struct Engine {
    bus: Rc<EventBus>,
    clock: Rc<dyn Clock>,
    config: EngineConfig,
    game_loop: Option<GameLoop>,
    state: Option<Rc<RefCell<StateMachine>>>,
    systems: Rc<RefCell<SystemRegistry>>,
    subscriptions: Vec<(&'static str, ListenerId)>,
    initialized: bool,
}

impl Engine {
    pub fn new(bus: Rc<EventBus>, clock: Rc<dyn Clock>, config: EngineConfig) -> Self {
        Engine {
            bus,
            clock,
            config,
            game_loop: None,
            state: None,
            systems: Rc::new(RefCell::new(SystemRegistry::default())),
            subscriptions: Vec::new(),
            initialized: false,
        }
    }

    /// Construct the loop and state machine, wire the bus handlers, then
    /// initialize every registered system in registration order. On the
    /// first system failure the wiring is rolled back and the error
    /// returned; systems after the failing one are untouched. Publishes
    /// `engine:ready` on success. Calling `init` twice is a warning no-op.
    pub fn init(&mut self) -> Result<(), EngineError> {
        if self.initialized {
            warn!("init() called on an initialized engine; ignoring");
            return Ok(());
        }

        let state = Rc::new(RefCell::new(StateMachine::new(Rc::clone(&self.bus))));
        let game_loop = GameLoop::new(Rc::clone(&self.bus), Rc::clone(&self.clock), &self.config);

        let sim_state = Rc::clone(&state);
        let sim_systems = Rc::clone(&self.systems);
        let id = self.bus.subscribe(names::LOOP_UPDATE, move |data| {
            if let EventData::Step { dt, time, .. } = data {
                sim_state.borrow_mut().update(*dt);
                for entry in sim_systems.borrow_mut().iter_mut() {
                    entry.system.update(*dt, *time);
                }
            }
            Ok(())
        });
        self.subscriptions.push((names::LOOP_UPDATE, id));

        let render_systems = Rc::clone(&self.systems);
        let id = self.bus.subscribe(names::LOOP_RENDER, move |data| {
            if let EventData::Frame {
                dt, interpolation, ..
            } = data
            {
                for entry in render_systems.borrow_mut().iter_mut() {
                    entry.system.render(*dt, *interpolation);
                }
            }
            Ok(())
        });
        self.subscriptions.push((names::LOOP_RENDER, id));

        self.game_loop = Some(game_loop);
        self.state = Some(state);

        if let Err(e) = self.init_systems() {
            self.unwire();
            return Err(e);
        }

        self.initialized = true;
        self.bus.publish(names::ENGINE_READY, &EventData::None);
        Ok(())
    }

    fn init_systems(&mut self) -> Result<(), EngineError> {
        let mut systems = self.systems.borrow_mut();
        for entry in systems.iter_mut() {
            entry.system.init().map_err(|e| EngineError::SystemInit {
                name: entry.name.clone(),
                reason: e,
            })?;
        }
        Ok(())
    }

    fn unwire(&mut self) {
        for (event, id) in self.subscriptions.drain(..) {
            self.bus.unsubscribe(event, id);
        }
        self.game_loop = None;
        self.state = None;
    }

    /// Enter the loading phase and start the loop. Requires a prior
    /// successful [`Engine::init`]; otherwise a warning no-op.
    pub fn start(&mut self) {
        if !self.initialized {
            warn!("start() called before init(); ignoring");
            return;
        }
        if let Some(state) = &self.state {
            state.borrow_mut().transition(Phase::Loading, None);
        }
        if let Some(game_loop) = self.game_loop.as_mut() {
            game_loop.start();
        }
        self.bus.publish(names::ENGINE_START, &EventData::None);
    }

    pub fn stop(&mut self) {
        let Some(game_loop) = self.game_loop.as_mut() else {
            warn!("stop() called before init(); ignoring");
            return;
        };
        game_loop.stop();
        self.bus.publish(names::ENGINE_STOP, &EventData::None);
    }

    /// Pause the loop and enter the paused phase.
    pub fn pause(&mut self) {
        let Some(game_loop) = self.game_loop.as_mut() else {
            return;
        };
        game_loop.pause();
        if let Some(state) = &self.state {
            let mut state = state.borrow_mut();
            if state.current().is_some() {
                state.transition(Phase::Paused, None);
            }
        }
    }

    /// Resume the loop and re-enter the phase that was current before the
    /// pause.
    pub fn resume(&mut self) {
        let Some(game_loop) = self.game_loop.as_mut() else {
            return;
        };
        game_loop.resume();
        if let Some(state) = &self.state {
            let mut state = state.borrow_mut();
            if state.current() == Some(Phase::Paused)
                && let Some(previous) = state.previous()
            {
                state.transition(previous, None);
            }
        }
    }

    /// Primary host channel: advance the loop by one frame.
    pub fn tick(&mut self) {
        if let Some(game_loop) = self.game_loop.as_mut() {
            game_loop.tick();
        }
    }

    /// Fallback host channel: tick once if the frame channel has stalled.
    pub fn poll_stall(&mut self) -> bool {
        self.game_loop
            .as_mut()
            .is_some_and(|game_loop| game_loop.poll_stall())
    }

    /// Register a system under a unique name. Duplicate names are a
    /// warning no-op. On an initialized engine the system's `init` runs
    /// immediately; if it fails the system is not registered.
    pub fn register_system(
        &mut self,
        name: impl Into<String>,
        system: Box<dyn System>,
    ) -> Result<(), EngineError> {
        let name = name.into();
        if self.systems.borrow().contains(&name) {
            warn!("system `{}` already registered; ignoring", name);
            return Ok(());
        }
        let mut system = system;
        if self.initialized {
            system.init().map_err(|e| EngineError::SystemInit {
                name: name.clone(),
                reason: e,
            })?;
        }
        debug!("registered system `{}`", name);
        self.systems.borrow_mut().push(name, system);
        Ok(())
    }

    /// Destroy and remove a system. Unknown names are a warning no-op.
    pub fn unregister_system(&mut self, name: &str) {
        match self.systems.borrow_mut().remove(name) {
            Some(mut system) => {
                system.destroy();
                debug!("unregistered system `{}`", name);
            }
            None => warn!("unregister_system: `{}` is not registered", name),
        }
    }

    pub fn system_count(&self) -> usize {
        self.systems.borrow().len()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_running(&self) -> bool {
        self.game_loop.as_ref().is_some_and(GameLoop::is_running)
    }

    pub fn is_paused(&self) -> bool {
        self.game_loop.as_ref().is_some_and(GameLoop::is_paused)
    }

    pub fn fps(&self) -> u32 {
        self.game_loop.as_ref().map_or(0, GameLoop::fps)
    }

    /// Shared handle to the state machine, available after `init`.
    /// Systems hold this to register hooks and request transitions between
    /// ticks.
    pub fn state_machine(&self) -> Option<Rc<RefCell<StateMachine>>> {
        self.state.clone()
    }

    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    /// Tear everything down: stop the loop, destroy every system in
    /// registration order, drop the bus wiring, and publish
    /// `engine:destroyed`. The engine returns to its pre-init state.
    pub fn destroy(&mut self) {
        if let Some(game_loop) = self.game_loop.as_mut()
            && game_loop.is_running()
        {
            game_loop.stop();
        }
        for mut entry in self.systems.borrow_mut().drain() {
            entry.system.destroy();
        }
        self.unwire();
        self.initialized = false;
        self.bus.publish(names::ENGINE_DESTROYED, &EventData::None);
    }
}
