//! Frame clock
//!
//! Every timing domain of the terminal (countdown, freeze window, reboot
//! pacing, key repeat, cursor blink) derives from one `Clock`. The clock
//! only moves when [`Clock::update`] is called once per frame, and time spent
//! paused never counts.

use crate::services::time_source::{RealTimeSource, SharedTimeSource};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Clock {
    source: SharedTimeSource,
    last_tick: Instant,
    /// Unpaused time accumulated since creation
    elapsed: Duration,
    /// Milliseconds counted by the most recent update
    frametime: u64,
    paused: bool,
}

impl Clock {
    /// Create a clock driven by the system time.
    pub fn new() -> Self {
        Self::with_source(RealTimeSource::shared())
    }

    pub fn with_source(source: SharedTimeSource) -> Self {
        let last_tick = source.now();
        Self {
            source,
            last_tick,
            elapsed: Duration::ZERO,
            frametime: 0,
            paused: false,
        }
    }

    /// Advance the clock to the current instant of its time source.
    pub fn update(&mut self) {
        let now = self.source.now();
        let delta = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;

        if self.paused {
            self.frametime = 0;
            return;
        }

        let before = self.time();
        self.elapsed += delta;
        self.frametime = self.time() - before;
    }

    /// Milliseconds of unpaused time as of the last update.
    pub fn time(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }

    /// Milliseconds that elapsed during the last update.
    pub fn frametime(&self) -> u64 {
        self.frametime
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            // The pause interval is never credited, even if no update ran during it
            self.last_tick = self.source.now();
            self.frametime = 0;
        }
        self.paused = paused;
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
