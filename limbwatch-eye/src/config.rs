//! Configuration for limbwatch-eye

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Pose model and video I/O configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// YOLOv8-pose ONNX file
    pub model_path: PathBuf,
    /// Square model input edge, in pixels
    pub input_size: u32,
    /// Minimum person score
    pub confidence_threshold: f32,
    /// Keypoints scored below this are reported as undetected
    pub keypoint_confidence: f32,
    /// Overlap above which the weaker of two person boxes is dropped
    pub iou_threshold: f32,
    /// Upper bound on people reported per frame
    pub max_detections: usize,
    /// Four-character codec code for the output file
    pub fourcc: String,
    /// Frames decoded ahead of analysis on a separate thread; 0 decodes inline
    pub prefetch_frames: usize,
}

impl Default for VisionConfig {
    fn default() -> Self {
        let model_path = dirs::home_dir()
            .map(|mut p| {
                p.push(".limbwatch");
                p.push("models");
                p
            })
            .unwrap_or_else(|| PathBuf::from("./models"))
            .join("yolov8m-pose.onnx");

        Self {
            model_path,
            input_size: 640,
            confidence_threshold: 0.3,
            keypoint_confidence: 0.5,
            iou_threshold: 0.45,
            max_detections: 100,
            fourcc: "mp4v".to_string(),
            prefetch_frames: 0,
        }
    }
}

impl VisionConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.input_size == 0 || self.input_size > 2048 || self.input_size % 32 != 0 {
            return Err("Input size must be a multiple of 32 between 32 and 2048".to_string());
        }

        for (name, value) in [
            ("Confidence threshold", self.confidence_threshold),
            ("Keypoint confidence", self.keypoint_confidence),
            ("IoU threshold", self.iou_threshold),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be between 0 and 1", name));
            }
        }

        if self.max_detections == 0 {
            return Err("Max detections must be at least 1".to_string());
        }

        if self.fourcc.chars().count() != 4 {
            return Err(format!("Codec '{}' must be exactly four characters", self.fourcc));
        }

        if self.prefetch_frames > 256 {
            return Err("Prefetch depth too large (max 256)".to_string());
        }

        Ok(())
    }

    pub fn fourcc_chars(&self) -> Option<[char; 4]> {
        let mut chars = self.fourcc.chars();
        Some([chars.next()?, chars.next()?, chars.next()?, chars.next()?])
    }
}
