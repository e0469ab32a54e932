//! Alert trigger, cooldown and visual-alert countdown
//!
//! Two states: idle (countdown 0) and alerting (countdown > 0). A trigger
//! needs the smoothed speed above the threshold *and* the cooldown since
//! the last trigger to have elapsed; it sets the countdown to the full
//! window. The countdown then drops by one per processed frame, whether
//! or not anyone was detected in that frame.

use crate::config::MonitorConfig;
use crate::types::BoundingBox;
use std::time::{Duration, Instant};

/// Trigger parameters, fixed for the run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertPolicy {
    pub threshold: f64,
    pub cooldown: Duration,
    pub window_frames: u32,
}

impl AlertPolicy {
    pub fn from_config(config: &MonitorConfig, fps: u32) -> Self {
        Self {
            threshold: config.violence_threshold,
            cooldown: config.cooldown(),
            window_frames: config.alert_window_frames(fps),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AlertState {
    last_alert: Option<Instant>,
    countdown: u32,
    display_box: Option<BoundingBox>,
}

impl AlertState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one smoothed speed sample. `now` is only read when the speed
    /// is over the threshold. Returns `true` if this sample triggered.
    pub fn evaluate(
        &mut self,
        policy: &AlertPolicy,
        speed: f64,
        now: impl FnOnce() -> Instant,
        bbox: Option<BoundingBox>,
    ) -> bool {
        if speed <= policy.threshold {
            return false;
        }

        let now = now();
        let cooled_down = self
            .last_alert
            .map_or(true, |last| now.saturating_duration_since(last) > policy.cooldown);
        if !cooled_down {
            return false;
        }

        self.last_alert = Some(now);
        self.countdown = policy.window_frames;
        if bbox.is_some() {
            self.display_box = bbox;
        }
        true
    }

    /// End-of-frame step: one frame of the visual window has been shown.
    pub fn tick(&mut self) {
        self.countdown = self.countdown.saturating_sub(1);
    }

    pub fn is_alerting(&self) -> bool {
        self.countdown > 0
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    pub fn last_alert(&self) -> Option<Instant> {
        self.last_alert
    }

    pub fn display_box(&self) -> Option<BoundingBox> {
        self.display_box
    }
}
