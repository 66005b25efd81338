//! Stall watchdog for the frame channel.
//!
//! The host's frame callback can be throttled (window hidden, tab in the
//! background), which would freeze the simulation. The watchdog tracks the
//! last primary tick and reports a stall once the gap exceeds a threshold,
//! at which point the loop runs the same tick path from its fallback
//! channel. Primary and fallback are mutually exclusive in effect: every
//! tick feeds [`Watchdog::note_tick`], so the fallback only fires when the
//! primary has genuinely gone quiet.

#[derive(Debug, Clone, Copy, PartialEq)]
enum WatchdogState {
    Disarmed,
    Armed { last_tick: f64 },
}

#[derive(Debug)]
pub struct Watchdog {
    threshold: f64,
    state: WatchdogState,
}

impl Watchdog {
    /// `threshold` is the stall gap in seconds; the watchdog starts disarmed.
    pub fn new(threshold: f64) -> Self {
        Watchdog {
            threshold,
            state: WatchdogState::Disarmed,
        }
    }

    /// Begin stall tracking, treating `now` as the most recent tick.
    pub fn arm(&mut self, now: f64) {
        self.state = WatchdogState::Armed { last_tick: now };
    }

    pub fn disarm(&mut self) {
        self.state = WatchdogState::Disarmed;
    }

    /// Record a tick on the primary channel. No-op while disarmed.
    pub fn note_tick(&mut self, now: f64) {
        if let WatchdogState::Armed { last_tick } = &mut self.state {
            *last_tick = now;
        }
    }

    /// True when armed and no tick has been seen for `threshold` seconds.
    pub fn is_stalled(&self, now: f64) -> bool {
        match self.state {
            WatchdogState::Disarmed => false,
            WatchdogState::Armed { last_tick } => now - last_tick >= self.threshold,
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, WatchdogState::Armed { .. })
    }
}
