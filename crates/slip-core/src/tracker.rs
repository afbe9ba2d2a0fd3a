#![forbid(unsafe_code)]

//! Movement tracking for one gesture.
//!
//! [`MovementTracker`] keeps three samples: where the gesture started, where
//! the pointer is now, and a trailing sample roughly one velocity window old.
//! The trailing sample only advances once the gap to the latest sample
//! exceeds the window, so a single high-frequency final event cannot collapse
//! the interval used for release velocity.

use std::time::Duration;

use crate::geometry::{AbsoluteMovement, Movement, PositionSample, millis};

/// Start, latest and trailing samples of the active gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementTracker {
    start: PositionSample,
    latest: PositionSample,
    previous: PositionSample,
    window: Duration,
}

impl MovementTracker {
    /// Create a tracker whose trailing sample lags by `window`.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            start: PositionSample::default(),
            latest: PositionSample::default(),
            previous: PositionSample::default(),
            window,
        }
    }

    /// Reset all three samples to the gesture origin.
    pub fn begin(&mut self, origin: PositionSample) {
        self.start = origin;
        self.latest = origin;
        self.previous = origin;
    }

    /// Record the newest pointer position.
    pub fn record(&mut self, sample: PositionSample) {
        self.latest = sample;
    }

    /// Advance the trailing sample if it has fallen more than one window behind.
    ///
    /// Called after the move has been handled, so handlers observe the
    /// trailing sample as it was before this event.
    pub fn refresh_trailing(&mut self) {
        if self.latest.time.saturating_sub(self.previous.time) > self.window {
            self.previous = self.latest;
        }
    }

    /// Shift the origin vertically, used when the scroll container moves.
    pub fn shift_start_y(&mut self, dy: f64) {
        self.start.y += dy;
    }

    #[must_use]
    pub const fn start(&self) -> PositionSample {
        self.start
    }

    #[must_use]
    pub const fn latest(&self) -> PositionSample {
        self.latest
    }

    #[must_use]
    pub const fn previous(&self) -> PositionSample {
        self.previous
    }

    /// Signed displacement since the gesture started.
    #[must_use]
    pub fn total_movement(&self) -> Movement {
        self.latest.delta_from(self.start)
    }

    /// Unsigned displacement and elapsed time since the gesture started.
    #[must_use]
    pub fn absolute_movement(&self) -> AbsoluteMovement {
        let total = self.total_movement();
        AbsoluteMovement {
            x: total.x.abs(),
            y: total.y.abs(),
            elapsed: self.latest.time.saturating_sub(self.start.time),
        }
    }

    /// Displacement across the trailing interval.
    #[must_use]
    pub fn last_interval(&self) -> Movement {
        self.latest.delta_from(self.previous)
    }

    /// Release velocity in px/ms over the trailing interval.
    ///
    /// The denominator carries `+1ms` so simultaneous samples never divide by
    /// zero.
    #[must_use]
    pub fn release_velocity(&self) -> f64 {
        let dt = millis(self.latest.time.saturating_sub(self.previous.time));
        self.last_interval().length() / (dt + 1.0)
    }
}
