#![forbid(unsafe_code)]

//! Pointer samples, displacement and rectangles.
//!
//! Touch and mouse input both reduce to a [`PositionSample`]: viewport pixels
//! plus the event timestamp on the host's monotonic clock. Touch samples are
//! shifted by the page scroll offset so drag math stays stable while the page
//! scrolls underneath the finger.

use std::time::Duration;

// ---------------------------------------------------------------------------
// PositionSample
// ---------------------------------------------------------------------------

/// A normalized pointer position at an event timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionSample {
    pub x: f64,
    pub y: f64,
    pub time: Duration,
}

impl PositionSample {
    /// Create a sample from raw coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64, time: Duration) -> Self {
        Self { x, y, time }
    }

    /// Sample a mouse event (`clientX`, `clientY`).
    #[must_use]
    pub const fn from_mouse(client_x: f64, client_y: f64, time: Duration) -> Self {
        Self::new(client_x, client_y, time)
    }

    /// Sample the first touch point, compensating for page scroll.
    #[must_use]
    pub fn from_touch(client_x: f64, client_y: f64, page_scroll_y: f64, time: Duration) -> Self {
        Self::new(client_x, client_y - page_scroll_y, time)
    }

    /// Signed displacement from `origin` to `self`.
    #[must_use]
    pub fn delta_from(self, origin: Self) -> Movement {
        Movement {
            x: self.x - origin.x,
            y: self.y - origin.y,
        }
    }
}

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

/// Signed displacement in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Movement {
    pub x: f64,
    pub y: f64,
}

impl Movement {
    /// Euclidean length.
    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// Unsigned displacement together with the time since the gesture began.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AbsoluteMovement {
    pub x: f64,
    pub y: f64,
    pub elapsed: Duration,
}

/// Milliseconds as a float, the unit velocities are expressed in.
#[must_use]
pub fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

// ---------------------------------------------------------------------------
// Rect
// ---------------------------------------------------------------------------

/// A viewport-relative rectangle, as returned by `getBoundingClientRect()`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_sample_subtracts_page_scroll() {
        let sample = PositionSample::from_touch(10.0, 250.0, 200.0, Duration::from_millis(5));
        assert_eq!(sample.x, 10.0);
        assert_eq!(sample.y, 50.0);
        assert_eq!(sample.time, Duration::from_millis(5));
    }

    #[test]
    fn mouse_sample_is_untouched() {
        let sample = PositionSample::from_mouse(3.5, 4.5, Duration::ZERO);
        assert_eq!(sample, PositionSample::new(3.5, 4.5, Duration::ZERO));
    }

    #[test]
    fn delta_is_signed() {
        let a = PositionSample::new(10.0, 10.0, Duration::ZERO);
        let b = PositionSample::new(4.0, 16.0, Duration::ZERO);
        assert_eq!(b.delta_from(a), Movement { x: -6.0, y: 6.0 });
        assert_eq!(Movement { x: 3.0, y: 4.0 }.length(), 5.0);
    }

    #[test]
    fn millis_keeps_fractions() {
        assert_eq!(millis(Duration::from_micros(1500)), 1.5);
    }
}
