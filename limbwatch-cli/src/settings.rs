//! Settings file: `[monitor]` and `[vision]` tables, both optional

use anyhow::{Context, Result};
use limbwatch_core::MonitorConfig;
use limbwatch_eye::VisionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub monitor: MonitorConfig,
    pub vision: VisionConfig,
}

/// Values given on the command line, which win over the settings file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model: Option<PathBuf>,
    pub threshold: Option<f64>,
    pub cooldown: Option<f64>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Invalid settings file {}", path.display()))
    }

    /// Defaults when no file is given
    pub fn resolve(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        settings.apply(overrides);
        settings.validate()?;
        Ok(settings)
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(model) = &overrides.model {
            self.vision.model_path = model.clone();
        }
        if let Some(threshold) = overrides.threshold {
            self.monitor.violence_threshold = threshold;
        }
        if let Some(cooldown) = overrides.cooldown {
            self.monitor.cooldown_secs = cooldown;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.monitor
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid [monitor] settings: {}", e))?;
        self.vision
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid [vision] settings: {}", e))
    }
}
