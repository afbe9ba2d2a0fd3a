#![forbid(unsafe_code)]

//! Tuning constants for gesture recognition and animation.
//!
//! Every default matches the values the recognizer was tuned with for touch
//! ergonomics, so `SlipConfig::default()` is the reference behavior. Hosts may
//! load a config from JSON when the `serde` feature is enabled; missing
//! fields fall back to their defaults and durations are written as
//! milliseconds.
//!
//! ```rust,ignore
//! let config: SlipConfig = serde_json::from_str(r#"{ "hold_delay": 450 }"#)?;
//! config.validate()?;
//! ```

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::SlipError;

/// Thresholds, timeouts and animation timings for a [`Slip`](crate::Slip) instance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SlipConfig {
    /// Stationary hold before reordering starts (default: 300ms).
    #[cfg_attr(feature = "serde", serde(with = "duration_ms"))]
    pub hold_delay: Duration,
    /// Time the pointer may stay outside the window while reordering (default: 700ms).
    #[cfg_attr(feature = "serde", serde(with = "duration_ms"))]
    pub leave_grace: Duration,
    /// Horizontal drift tolerated during the hold (default: 15px).
    pub hold_tolerance_x: f64,
    /// Vertical drift tolerated during the hold (default: 25px).
    pub hold_tolerance_y: f64,
    /// Horizontal displacement that proposes a swipe (default: 20px).
    pub swipe_trigger: f64,
    /// Vertical displacement that abandons an undecided gesture (default: 20px).
    pub scroll_abort: f64,
    /// Lower bound of the vertical room allowed while proposing a swipe (default: 100px).
    pub swipe_min_vertical_room: f64,
    /// Vertical slack beyond the element height before a swipe aborts (default: 20px).
    pub swipe_vertical_slack: f64,
    /// `x > ratio * y` marks a move as horizontal and suppresses scrolling (default: 1.2).
    pub horizontal_dominance: f64,
    /// Release velocity needed to commit a swipe, in px/ms (default: 0.6).
    pub swipe_min_velocity: f64,
    /// Minimum gesture duration for a swipe commit (default: 110ms).
    #[cfg_attr(feature = "serde", serde(with = "duration_ms"))]
    pub swipe_min_duration: Duration,
    /// Age of the trailing sample used for release velocity (default: 100ms).
    #[cfg_attr(feature = "serde", serde(with = "duration_ms"))]
    pub velocity_window: Duration,
    /// Snap-back transition length (default: 100ms).
    #[cfg_attr(feature = "serde", serde(with = "duration_ms"))]
    pub settle_duration: Duration,
    /// Swipe-off transition length (default: 100ms).
    #[cfg_attr(feature = "serde", serde(with = "duration_ms"))]
    pub swipe_out_duration: Duration,
    /// Transition applied to siblings making room during a reorder (default: 200ms).
    #[cfg_attr(feature = "serde", serde(with = "duration_ms"))]
    pub sibling_shift_duration: Duration,
    /// Scroll the container while a moved element is this close to its edge.
    pub auto_scroll: bool,
    /// Edge distance that triggers auto-scroll (default: 40px).
    pub auto_scroll_trigger: f64,
    /// z-index given to the element being reordered.
    pub reordering_z_index: i32,
    /// Prefix transforms with `translateZ(..)` to force compositor layers.
    pub hardware_layer_hint: bool,
    /// Set `transform-style: preserve-3d` on the container while reordering,
    /// for compositors that do not sort 2D layers.
    pub preserve_3d_while_reordering: bool,
    /// Keep a no-op `touchstart` listener on the document body while any
    /// instance is attached, for browsers that otherwise drop touch events.
    pub body_touch_workaround: bool,
}

impl Default for SlipConfig {
    fn default() -> Self {
        Self {
            hold_delay: Duration::from_millis(300),
            leave_grace: Duration::from_millis(700),
            hold_tolerance_x: 15.0,
            hold_tolerance_y: 25.0,
            swipe_trigger: 20.0,
            scroll_abort: 20.0,
            swipe_min_vertical_room: 100.0,
            swipe_vertical_slack: 20.0,
            horizontal_dominance: 1.2,
            swipe_min_velocity: 0.6,
            swipe_min_duration: Duration::from_millis(110),
            velocity_window: Duration::from_millis(100),
            settle_duration: Duration::from_millis(100),
            swipe_out_duration: Duration::from_millis(100),
            sibling_shift_duration: Duration::from_millis(200),
            auto_scroll: true,
            auto_scroll_trigger: 40.0,
            reordering_z_index: 99999,
            hardware_layer_hint: true,
            preserve_3d_while_reordering: false,
            body_touch_workaround: false,
        }
    }
}

impl SlipConfig {
    /// Check that every threshold is usable.
    ///
    /// Distances and ratios must be finite and positive; durations must be
    /// non-zero.
    pub fn validate(&self) -> Result<(), SlipError> {
        let distances = [
            ("hold_tolerance_x", self.hold_tolerance_x),
            ("hold_tolerance_y", self.hold_tolerance_y),
            ("swipe_trigger", self.swipe_trigger),
            ("scroll_abort", self.scroll_abort),
            ("swipe_min_vertical_room", self.swipe_min_vertical_room),
            ("swipe_vertical_slack", self.swipe_vertical_slack),
            ("horizontal_dominance", self.horizontal_dominance),
            ("swipe_min_velocity", self.swipe_min_velocity),
            ("auto_scroll_trigger", self.auto_scroll_trigger),
        ];
        for (field, value) in distances {
            if !value.is_finite() || value <= 0.0 {
                return Err(SlipError::InvalidConfig {
                    field,
                    reason: format!("must be finite and positive, got {value}"),
                });
            }
        }

        let durations = [
            ("hold_delay", self.hold_delay),
            ("leave_grace", self.leave_grace),
            ("swipe_min_duration", self.swipe_min_duration),
            ("velocity_window", self.velocity_window),
            ("settle_duration", self.settle_duration),
            ("swipe_out_duration", self.swipe_out_duration),
            ("sibling_shift_duration", self.sibling_shift_duration),
        ];
        for (field, value) in durations {
            if value.is_zero() {
                return Err(SlipError::InvalidConfig {
                    field,
                    reason: "must be non-zero".to_owned(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SlipConfig::default().validate().is_ok());
    }

    #[test]
    fn default_thresholds() {
        let config = SlipConfig::default();
        assert_eq!(config.hold_delay, Duration::from_millis(300));
        assert_eq!(config.leave_grace, Duration::from_millis(700));
        assert_eq!(config.swipe_min_duration, Duration::from_millis(110));
        assert_eq!(config.swipe_min_velocity, 0.6);
        assert_eq!(config.swipe_trigger, 20.0);
        assert_eq!(config.hold_tolerance_x, 15.0);
        assert_eq!(config.hold_tolerance_y, 25.0);
    }

    #[test]
    fn nan_threshold_rejected() {
        let config = SlipConfig {
            swipe_min_velocity: f64::NAN,
            ..SlipConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            SlipError::InvalidConfig {
                field: "swipe_min_velocity",
                ..
            }
        ));
    }

    #[test]
    fn zero_duration_rejected() {
        let config = SlipConfig {
            hold_delay: Duration::ZERO,
            ..SlipConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SlipError::InvalidConfig {
                field: "hold_delay",
                ..
            })
        ));
    }

    #[test]
    fn negative_distance_rejected() {
        let config = SlipConfig {
            hold_tolerance_y: -1.0,
            ..SlipConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
