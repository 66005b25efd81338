//! Demo race flow: phase scripting, telemetry, and kart assembly.
//!
//! This is the game-level glue the headless demo binary wires into the
//! engine. It doubles as a reference for how collaborators are expected to
//! plug in: systems hold their own [`EntityStore`] and drive it from
//! `update`, and request phase transitions through the shared
//! [`StateMachine`] handle between ticks.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info};

use crate::engine::System;
use crate::entity::{Component, EntityId, EntityStore, Transform};
use crate::statemachine::{Phase, StateMachine};

/// Accumulates driven distance while the kart entity updates.
pub struct Odometer {
    pub speed: f32,
    pub distance: f32,
}

impl Odometer {
    pub fn new(speed: f32) -> Self {
        Odometer {
            speed,
            distance: 0.0,
        }
    }
}

impl Component for Odometer {
    fn attach(&mut self, owner: EntityId) {
        debug!("odometer attached to {}", owner);
    }

    fn update(&mut self, dt: f32) {
        self.distance += self.speed * dt;
    }

    fn destroy(&mut self) {
        info!("odometer final distance: {:.1}", self.distance);
    }
}

/// Build a player kart with four wheel children.
pub fn spawn_kart(store: &mut EntityStore) -> EntityId {
    let kart = store.spawn("vehicle");
    if let Some(entity) = store.get_mut(kart) {
        entity.tags.insert("player".into());
        entity.transform = Transform::from_position(0.0, 0.0, 0.0);
    }
    store.add_component(kart, "odometer", Box::new(Odometer::new(12.0)));

    let wheel_offsets = [
        (-0.6, 0.0, 0.9),
        (0.6, 0.0, 0.9),
        (-0.6, 0.0, -0.9),
        (0.6, 0.0, -0.9),
    ];
    for (x, y, z) in wheel_offsets {
        let wheel = store.spawn("wheel");
        if let Some(entity) = store.get_mut(wheel) {
            entity.transform = Transform::from_position(x, y, z);
        }
        if let Err(e) = store.add_child(kart, wheel) {
            debug!("failed to attach wheel: {}", e);
        }
    }
    kart
}

/// Scripted phase progression for the headless demo: loading → lobby →
/// countdown → racing → results on simulated-time thresholds. While
/// racing it also drives the kart entity hierarchy.
pub struct RaceDirector {
    state: Rc<RefCell<StateMachine>>,
    store: EntityStore,
    kart: Option<EntityId>,
    elapsed: f32,
}

impl RaceDirector {
    pub fn new(state: Rc<RefCell<StateMachine>>) -> Self {
        RaceDirector {
            state,
            store: EntityStore::new(),
            kart: None,
            elapsed: 0.0,
        }
    }
}

impl System for RaceDirector {
    fn init(&mut self) -> Result<(), String> {
        let kart = spawn_kart(&mut self.store);
        info!(
            "race director ready: kart {} with {} wheels",
            kart,
            self.store.children(kart).len()
        );
        self.kart = Some(kart);
        Ok(())
    }

    fn update(&mut self, dt: f32, _time: f64) {
        self.elapsed += dt;

        let current = self.state.borrow().current();
        if current == Some(Phase::Racing)
            && let Some(kart) = self.kart
        {
            self.store.update(kart, dt);
        }

        let next = match current {
            Some(Phase::Loading) if self.elapsed >= 0.5 => Some(Phase::Lobby),
            Some(Phase::Lobby) if self.elapsed >= 1.5 => Some(Phase::Countdown),
            Some(Phase::Countdown) if self.elapsed >= 4.5 => Some(Phase::Racing),
            Some(Phase::Racing) if self.elapsed >= 8.0 => Some(Phase::Results),
            _ => None,
        };
        if let Some(next) = next {
            self.state.borrow_mut().transition(next, None);
        }
    }

    fn destroy(&mut self) {
        if let Some(kart) = self.kart.take() {
            let position = self.store.world_position(kart);
            info!(
                "tearing down kart {} at ({:.1}, {:.1}, {:.1})",
                kart, position.x, position.y, position.z
            );
            self.store.destroy(kart);
        }
    }
}

/// Logs loop health roughly once per second of loop time.
pub struct Telemetry {
    updates: u64,
    frames: u64,
    last_report: f64,
}

impl Telemetry {
    pub fn new() -> Self {
        Telemetry {
            updates: 0,
            frames: 0,
            last_report: 0.0,
        }
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl System for Telemetry {
    fn update(&mut self, _dt: f32, time: f64) {
        self.updates += 1;
        if time - self.last_report >= 1.0 {
            info!(
                "telemetry: {} sim steps, {} frames",
                self.updates, self.frames
            );
            self.last_report = time;
        }
    }

    fn render(&mut self, _dt: f32, _interpolation: f32) {
        self.frames += 1;
    }

    fn destroy(&mut self) {
        info!(
            "telemetry total: {} sim steps, {} frames",
            self.updates, self.frames
        );
    }
}
