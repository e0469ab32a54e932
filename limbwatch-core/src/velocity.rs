//! Noise-gated, exponentially smoothed limb speed

use crate::config::MonitorConfig;
use crate::locator::TrackingState;
use crate::types::Point;
use tracing::trace;

/// Turns one frame of limb displacement into a smoothed speed.
///
/// `speed = factor * previous + (1 - factor) * raw`, where `previous`
/// defaults to the first raw value seen for that limb so a cold start is
/// not biased toward zero. Displacements below `min_displacement` are
/// dropped without touching the stored speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityEstimator {
    min_displacement: f64,
    smoothing_factor: f64,
}

impl VelocityEstimator {
    pub fn new(min_displacement: f64, smoothing_factor: f64) -> Self {
        Self { min_displacement, smoothing_factor }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.min_displacement, config.smoothing_factor)
    }

    /// Smoothed speed in pixels per second, or `None` for sub-threshold jitter.
    pub fn estimate(
        &self,
        limb: &str,
        current: Point,
        previous: Point,
        interval_secs: f64,
        tracking: &mut TrackingState,
    ) -> Option<f64> {
        let displacement = current.distance_to(&previous);
        if displacement < self.min_displacement {
            trace!("{} moved {:.2}px, below noise gate", limb, displacement);
            return None;
        }

        let raw = displacement / interval_secs;
        let previous_speed = tracking.smoothed_speed(limb).unwrap_or(raw);
        let speed = self.smoothing_factor * previous_speed + (1.0 - self.smoothing_factor) * raw;
        tracking.set_smoothed_speed(limb, speed);
        Some(speed)
    }
}

impl Default for VelocityEstimator {
    fn default() -> Self {
        Self::from_config(&MonitorConfig::default())
    }
}
