//! Fixed-timestep game loop.
//!
//! The host drives [`GameLoop::tick`] once per display frame. Each tick
//! accumulates the elapsed wall time (clamped to `max_frame_time` so a
//! slow frame cannot snowball into ever more catch-up work), drains the
//! accumulator in `fixed_timestep` increments — publishing one
//! `loop:update` per increment — and finishes with exactly one
//! `loop:render` carrying the interpolation factor toward the next step.
//!
//! [`GameLoop::poll_stall`] is the fallback channel: hosts whose frame
//! callback can be throttled call it from a low-priority timer, and it
//! runs the same tick path once the watchdog reports a stall.

use std::rc::Rc;

use log::{debug, warn};

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::events::{names, EventBus, EventData};
use crate::watchdog::Watchdog;

/// Tick counter over a rolling one-second wall-clock window, independent
/// of the simulation rate.
#[derive(Debug, Default)]
struct FpsCounter {
    window_start: Option<f64>,
    frames: u32,
    current: u32,
}

impl FpsCounter {
    fn note_frame(&mut self, now: f64) {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;
        if now - start >= 1.0 {
            self.current = self.frames;
            self.frames = 0;
            self.window_start = Some(now);
        }
    }

    fn reset(&mut self) {
        *self = FpsCounter::default();
    }
}

pub struct GameLoop {
    bus: Rc<EventBus>,
    clock: Rc<dyn Clock>,
    fixed_timestep: f32,
    max_frame_time: f32,
    accumulator: f32,
    last_time: Option<f64>,
    running: bool,
    paused: bool,
    watchdog: Watchdog,
    fps: FpsCounter,
}

impl GameLoop {
    pub fn new(bus: Rc<EventBus>, clock: Rc<dyn Clock>, config: &EngineConfig) -> Self {
        GameLoop {
            bus,
            clock,
            fixed_timestep: config.fixed_timestep,
            max_frame_time: config.max_frame_time,
            accumulator: 0.0,
            last_time: None,
            running: false,
            paused: false,
            watchdog: Watchdog::new(config.stall_threshold as f64),
            fps: FpsCounter::default(),
        }
    }

    pub fn start(&mut self) {
        if self.running {
            warn!("start() called on a running loop; ignoring");
            return;
        }
        let now = self.clock.now();
        self.running = true;
        self.paused = false;
        self.accumulator = 0.0;
        self.last_time = Some(now);
        self.fps.reset();
        self.watchdog.arm(now);
        self.bus.publish(names::LOOP_START, &EventData::None);
    }

    /// Hard stop: no further events are published after this returns.
    pub fn stop(&mut self) {
        if !self.running {
            warn!("stop() called on a stopped loop; ignoring");
            return;
        }
        self.running = false;
        self.paused = false;
        self.watchdog.disarm();
        self.bus.publish(names::LOOP_STOP, &EventData::None);
    }

    pub fn pause(&mut self) {
        if !self.running || self.paused {
            return;
        }
        self.paused = true;
        self.bus.publish(names::LOOP_PAUSE, &EventData::None);
    }

    /// Simulation time lost while paused is dropped, not replayed: the
    /// accumulator resets and timing restarts from the current instant.
    pub fn resume(&mut self) {
        if !self.running || !self.paused {
            return;
        }
        self.paused = false;
        self.accumulator = 0.0;
        self.last_time = Some(self.clock.now());
        self.bus.publish(names::LOOP_RESUME, &EventData::None);
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Advance by one host frame. Safe to call redundantly; does nothing
    /// while stopped.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }
        let now = self.clock.now();
        self.watchdog.note_tick(now);
        self.fps.note_frame(now);

        let last = self.last_time.replace(now).unwrap_or(now);
        let mut frame_time = (now - last) as f32;
        if frame_time > self.max_frame_time {
            frame_time = self.max_frame_time;
        }

        if self.paused {
            return;
        }

        self.accumulator += frame_time;
        while self.accumulator >= self.fixed_timestep {
            self.bus.publish(
                names::LOOP_UPDATE,
                &EventData::Step {
                    dt: self.fixed_timestep,
                    accumulator: self.accumulator,
                    time: now,
                },
            );
            self.accumulator -= self.fixed_timestep;
        }

        self.bus.publish(
            names::LOOP_RENDER,
            &EventData::Frame {
                dt: frame_time,
                interpolation: self.accumulator / self.fixed_timestep,
                fps: self.fps.current,
                time: now,
            },
        );
    }

    /// Fallback channel: run one tick if the primary channel has stalled
    /// past the watchdog threshold. Returns whether a tick was run.
    pub fn poll_stall(&mut self) -> bool {
        if !self.running {
            return false;
        }
        if self.watchdog.is_stalled(self.clock.now()) {
            debug!("frame channel stalled; ticking from the watchdog");
            self.tick();
            return true;
        }
        false
    }

    pub fn fps(&self) -> u32 {
        self.fps.current
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn fixed_timestep(&self) -> f32 {
        self.fixed_timestep
    }

    /// Unconsumed frame time carried toward the next tick.
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }
}
