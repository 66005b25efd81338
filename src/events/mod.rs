//! Event bus and event payloads used by the runtime core.
//!
//! Every cross-component signal in the engine travels through the
//! [`EventBus`] as a namespaced `domain:subject` name plus an [`EventData`]
//! payload. Events provide a decoupled way for the loop, the state machine,
//! and game systems to communicate without direct dependencies.
//!
//! Submodules:
//! - [`bus`] – publish/subscribe registry with persistent and once listeners
//! - [`names`] – the well-known event names the core publishes
//!
//! Bus instances are always injected (`Rc<EventBus>`); there is no global
//! default, so tests run against a fresh bus.

pub mod bus;
pub mod names;

pub use bus::{EventBus, ListenerId};

use crate::statemachine::Phase;

/// Payload attached to a published event.
#[derive(Debug, Clone)]
pub enum EventData {
    /// No payload.
    None,
    /// One fixed simulation step. `accumulator` is the unconsumed frame
    /// time at emission, `time` the clock reading of the emitting tick.
    Step { dt: f32, accumulator: f32, time: f64 },
    /// One render frame. `interpolation` is the fractional progress toward
    /// the next simulation step, for blending between simulated states.
    Frame {
        dt: f32,
        interpolation: f32,
        fps: u32,
        time: f64,
    },
    /// A phase transition; `from` is empty for the machine's first phase.
    PhaseChange {
        from: Option<Phase>,
        to: Phase,
        data: Option<serde_json::Value>,
    },
    /// Free-form payload for game-level events.
    Value(serde_json::Value),
}
