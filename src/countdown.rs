//! Lock-out countdown
//!
//! The countdown shows the time the player has left before the terminal is
//! locked. Crossing each warning threshold opens a flash window during which
//! the display blinks in an enlarged font; once the remaining time drops to
//! the configured warning mark the display also switches to the warning
//! colour.

use ratatui::style::Color;
use std::collections::VecDeque;

/// Threshold marks (seconds) that follow the configured warning mark
const FOLLOW_UP_THRESHOLDS: [u64; 6] = [15, 5, 4, 3, 2, 1];

#[derive(Debug, Clone)]
pub struct CountdownTimer {
    /// Remaining time in milliseconds
    remaining_ms: u64,
    warning_secs: u64,
    /// Thresholds (seconds) not yet crossed, strictly decreasing
    thresholds: VecDeque<u64>,
    /// Remaining time at which the current flash window opened
    flash_start: Option<u64>,
}

impl CountdownTimer {
    /// How long a flash window lasts
    pub const FLASH_MS: u64 = 3000;
    /// Visible part of one blink period
    pub const FLASH_ON_MS: u64 = 600;
    /// Hidden part of one blink period
    pub const FLASH_OFF_MS: u64 = 400;

    pub const COLOUR: Color = Color::Rgb(255, 255, 255);
    pub const WARNING_COLOUR: Color = Color::Rgb(200, 0, 0);

    pub fn new(time_secs: u64, warning_secs: u64) -> Self {
        let mut thresholds = VecDeque::from([warning_secs]);
        for mark in FOLLOW_UP_THRESHOLDS {
            if thresholds.back().is_some_and(|&last| mark < last) {
                thresholds.push_back(mark);
            }
        }

        Self {
            remaining_ms: time_secs.saturating_mul(1000),
            warning_secs,
            thresholds,
            flash_start: None,
        }
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn secs_left(&self) -> u64 {
        self.remaining_ms / 1000
    }

    pub fn ended(&self) -> bool {
        self.remaining_ms == 0
    }

    pub fn is_flashing(&self) -> bool {
        self.flash_start.is_some()
    }

    /// Whether the display uses the warning colour
    pub fn is_warning(&self) -> bool {
        self.secs_left() <= self.warning_secs
    }

    /// Thresholds that have not fired yet, largest first
    pub fn pending_thresholds(&self) -> impl Iterator<Item = u64> + '_ {
        self.thresholds.iter().copied()
    }

    /// Subtract elapsed time and re-evaluate the flash window.
    pub fn update(&mut self, elapsed_ms: u64) {
        self.remaining_ms = self.remaining_ms.saturating_sub(elapsed_ms);
        if self.remaining_ms == 0 {
            self.flash_start = None;
            return;
        }

        if let Some(start) = self.flash_start {
            if start - self.remaining_ms > Self::FLASH_MS {
                self.flash_start = None;
            }
        }

        let secs_left = self.secs_left();
        if self.flash_start.is_none()
            && self.thresholds.front().is_some_and(|&t| secs_left <= t)
        {
            tracing::debug!(secs_left, "countdown crossed warning threshold");
            self.flash_start = Some(self.remaining_ms);

            // A large step may cross several thresholds; they all fire as one window
            while self.thresholds.front().is_some_and(|&t| secs_left <= t) {
                self.thresholds.pop_front();
            }
        }
    }

    /// Current display state.
    pub fn view(&self) -> CountdownView {
        let flashing = self.is_flashing();
        let visible = !flashing
            || self.remaining_ms % (Self::FLASH_ON_MS + Self::FLASH_OFF_MS) >= Self::FLASH_OFF_MS;
        let (minutes, seconds) = (self.secs_left() / 60, self.secs_left() % 60);

        CountdownView {
            text: format!("{}:{:02}", minutes, seconds),
            colour: if self.is_warning() {
                Self::WARNING_COLOUR
            } else {
                Self::COLOUR
            },
            large: flashing,
            visible,
        }
    }
}

/// Rendering state of the countdown display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownView {
    /// Remaining time as `M:SS`
    pub text: String,
    pub colour: Color,
    /// Enlarged font while a flash window is open
    pub large: bool,
    /// False during the off phase of a blink
    pub visible: bool,
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: zero-length updates never change the timer
        #[test]
        fn prop_zero_step_is_idempotent(time in 1u64..120, steps in prop::collection::vec(0u64..5_000, 0..30)) {
            let mut timer = CountdownTimer::new(time, 30);
            for step in steps {
                timer.update(step);
            }
            timer.update(0);
            let before = (timer.remaining_ms(), timer.is_flashing(), timer.pending_thresholds().collect::<Vec<_>>());
            timer.update(0);
            let after = (timer.remaining_ms(), timer.is_flashing(), timer.pending_thresholds().collect::<Vec<_>>());
            prop_assert_eq!(before, after);
        }

        /// Property: once ended, the timer stays ended and never flashes
        #[test]
        fn prop_ended_is_terminal(time in 1u64..60, steps in prop::collection::vec(0u64..10_000, 1..40)) {
            let mut timer = CountdownTimer::new(time, 30);
            let mut ended = false;
            let mut total = 0u64;
            for step in steps {
                timer.update(step);
                total += step;
                prop_assert_eq!(timer.ended(), total >= time * 1000);
                if ended {
                    prop_assert!(timer.ended());
                    prop_assert!(!timer.is_flashing());
                }
                ended = timer.ended();
            }
        }

        /// Property: the pending threshold queue only ever shrinks
        #[test]
        fn prop_thresholds_only_shrink(steps in prop::collection::vec(0u64..3_000, 1..60)) {
            let mut timer = CountdownTimer::new(45, 30);
            let mut count = timer.pending_thresholds().count();
            for step in steps {
                timer.update(step);
                let now = timer.pending_thresholds().count();
                prop_assert!(now <= count);
                count = now;
            }
        }
    }
}
