//! Configuration for the motion analyzer

use crate::error::{MonitorError, Result};
use crate::types::landmark;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// A named limb and the keypoints that can stand in for it, best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimbDefinition {
    pub name: String,
    pub keypoints: Vec<usize>,
}

impl LimbDefinition {
    pub fn new(name: impl Into<String>, keypoints: Vec<usize>) -> Self {
        Self { name: name.into(), keypoints }
    }

    /// Wrist, then elbow, then shoulder of the right side
    pub fn right_arm() -> Self {
        Self::new(
            "Right Arm",
            vec![landmark::RIGHT_WRIST, landmark::RIGHT_ELBOW, landmark::RIGHT_SHOULDER],
        )
    }

    /// Wrist, then elbow, then shoulder of the left side
    pub fn left_arm() -> Self {
        Self::new(
            "Left Arm",
            vec![landmark::LEFT_WRIST, landmark::LEFT_ELBOW, landmark::LEFT_SHOULDER],
        )
    }
}

/// Upper bound for `cooldown_secs` and `visual_alert_secs` (one day)
pub const MAX_DURATION_SECS: f64 = 86_400.0;

/// Motion analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Smoothed speed (pixels per second) above which a limb triggers an alert
    pub violence_threshold: f64,
    /// Displacements shorter than this many pixels are treated as jitter
    pub min_displacement: f64,
    /// Weight of the previous smoothed speed in the moving average
    pub smoothing_factor: f64,
    /// Minimum time between two accepted alerts
    pub cooldown_secs: f64,
    /// How long the warning overlay stays on screen after a trigger
    pub visual_alert_secs: f64,
    /// Frame rate used when the input stream does not report one
    pub default_fps: u32,
    /// Number of alert frames kept as evidence
    pub evidence_capacity: usize,
    /// Text drawn while an alert is active
    pub warning_label: String,
    /// Limbs to watch
    pub limbs: Vec<LimbDefinition>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            violence_threshold: 11_000.0,
            min_displacement: 4.0,
            smoothing_factor: 0.8,
            cooldown_secs: 5.0,
            visual_alert_secs: 2.0,
            default_fps: 25,
            evidence_capacity: 3,
            warning_label: "VIOLENT ACTION DETECTED!".to_string(),
            limbs: vec![LimbDefinition::right_arm(), LimbDefinition::left_arm()],
        }
    }
}

impl MonitorConfig {
    /// Load a standalone monitor config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate().map_err(MonitorError::Config)?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.violence_threshold.is_finite() || self.violence_threshold <= 0.0 {
            return Err("Violence threshold must be a positive number".to_string());
        }

        if !self.min_displacement.is_finite() || self.min_displacement < 0.0 {
            return Err("Minimum displacement must be zero or positive".to_string());
        }

        if !(0.0..1.0).contains(&self.smoothing_factor) {
            return Err("Smoothing factor must be in [0, 1)".to_string());
        }

        if !(0.0..=MAX_DURATION_SECS).contains(&self.cooldown_secs) {
            return Err(format!("Cooldown must be between 0 and {} seconds", MAX_DURATION_SECS));
        }

        if !(0.0..=MAX_DURATION_SECS).contains(&self.visual_alert_secs) {
            return Err(format!("Visual alert duration must be between 0 and {} seconds", MAX_DURATION_SECS));
        }

        if self.default_fps == 0 || self.default_fps > 240 {
            return Err("Default frame rate must be between 1 and 240".to_string());
        }

        if self.evidence_capacity == 0 {
            return Err("Evidence capacity must be at least 1".to_string());
        }

        if self.limbs.is_empty() {
            return Err("At least one limb must be configured".to_string());
        }

        for limb in &self.limbs {
            if limb.name.trim().is_empty() {
                return Err("Limb names cannot be empty".to_string());
            }
            if limb.keypoints.is_empty() {
                return Err(format!("Limb '{}' has no keypoints", limb.name));
            }
            if let Some(bad) = limb.keypoints.iter().find(|&&i| i >= landmark::COUNT) {
                return Err(format!(
                    "Limb '{}' references keypoint {} (max {})",
                    limb.name,
                    bad,
                    landmark::COUNT - 1
                ));
            }
        }

        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.cooldown_secs)
    }

    /// Number of frames the warning overlay stays up at `fps`
    pub fn alert_window_frames(&self, fps: u32) -> u32 {
        (self.visual_alert_secs * f64::from(fps)) as u32
    }
}
