//! Well-known event names published by the runtime core.
//!
//! Names follow the `domain:subject` convention. Phase events
//! (`game:<phase>`) come from [`Phase::event_name`](crate::statemachine::Phase::event_name).

pub const LOOP_UPDATE: &str = "loop:update";
pub const LOOP_RENDER: &str = "loop:render";
pub const LOOP_START: &str = "loop:start";
pub const LOOP_STOP: &str = "loop:stop";
pub const LOOP_PAUSE: &str = "loop:pause";
pub const LOOP_RESUME: &str = "loop:resume";

pub const ENGINE_READY: &str = "engine:ready";
pub const ENGINE_START: &str = "engine:start";
pub const ENGINE_STOP: &str = "engine:stop";
pub const ENGINE_DESTROYED: &str = "engine:destroyed";
