//! YOLOv8-pose person and keypoint detection

use crate::config::VisionConfig;
use crate::error::VisionError;
use crate::utils::mat_to_chw_tensor;
use limbwatch_core::{
    BoundingBox, KeypointSet, MonitorError, Person, PoseDetection, PoseModel, Point,
};
use opencv::{core::Mat, prelude::*};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use tracing::{debug, info};

/// Box (4) + person score (1) + 17 keypoints × (x, y, score)
pub const POSE_CHANNELS: usize = 56;
const KEYPOINTS: usize = 17;

/// Everything the decoder needs besides the raw tensor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeParams {
    pub input_size: u32,
    pub frame_width: f32,
    pub frame_height: f32,
    pub confidence_threshold: f32,
    pub keypoint_confidence: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl DecodeParams {
    pub fn new(config: &VisionConfig, frame_width: f32, frame_height: f32) -> Self {
        Self {
            input_size: config.input_size,
            frame_width,
            frame_height,
            confidence_threshold: config.confidence_threshold,
            keypoint_confidence: config.keypoint_confidence,
            iou_threshold: config.iou_threshold,
            max_detections: config.max_detections,
        }
    }
}

/// YOLOv8-pose ONNX model
pub struct YoloPoseModel {
    session: Session,
    config: VisionConfig,
}

impl YoloPoseModel {
    pub fn new(config: &VisionConfig) -> Result<Self, VisionError> {
        config.validate().map_err(VisionError::Config)?;
        if !config.model_path.is_file() {
            return Err(VisionError::Model(format!(
                "Pose model not found at {:?}",
                config.model_path
            )));
        }

        let session = Session::builder()
            .map_err(|e| VisionError::Ort(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| VisionError::Ort(format!("Failed to set optimization level: {}", e)))?
            .commit_from_file(&config.model_path)
            .map_err(|e| VisionError::Ort(format!("Failed to load pose model: {}", e)))?;

        info!("Pose model loaded from {:?}", config.model_path);

        Ok(Self { session, config: config.clone() })
    }

    /// Detect people and their keypoints in a BGR frame.
    pub fn detect(&mut self, frame: &Mat) -> Result<PoseDetection, VisionError> {
        let size = self.config.input_size;
        let edge = size as usize;
        let input_data = mat_to_chw_tensor(frame, size)?;
        let input = Tensor::from_array(([1usize, 3, edge, edge], input_data))
            .map_err(|e| VisionError::Ort(format!("Failed to create input tensor: {}", e)))?;

        let outputs = self
            .session
            .run(ort::inputs![input])
            .map_err(|e| VisionError::Ort(format!("Pose inference failed: {}", e)))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| VisionError::Ort(format!("Failed to extract output tensor: {}", e)))?;
        let shape: Vec<i64> = shape.iter().copied().collect();
        debug!("Pose output shape: {:?}", shape);

        let params = DecodeParams::new(&self.config, frame.cols() as f32, frame.rows() as f32);
        let people = decode_predictions(data, &shape, &params)?;
        debug!("Detected {} people", people.len());
        Ok(PoseDetection { people })
    }
}

impl PoseModel for YoloPoseModel {
    type Frame = Mat;

    fn infer(&mut self, frame: &Mat) -> limbwatch_core::Result<PoseDetection> {
        self.detect(frame).map_err(MonitorError::from)
    }
}

/// Decode a raw `[1, 56, N]` (or transposed `[1, N, 56]`) output into
/// people in frame coordinates, strongest first.
pub fn decode_predictions(
    data: &[f32],
    shape: &[i64],
    params: &DecodeParams,
) -> Result<Vec<Person>, VisionError> {
    if shape.len() != 3 || shape[0] != 1 {
        return Err(VisionError::Model(format!("Unexpected pose output shape {:?}", shape)));
    }
    let (dim1, dim2) = (shape[1].max(0) as usize, shape[2].max(0) as usize);
    let (candidates, channel_major) = if dim1 == POSE_CHANNELS {
        (dim2, true)
    } else if dim2 == POSE_CHANNELS {
        (dim1, false)
    } else {
        return Err(VisionError::Model(format!(
            "Pose output has no {}-value axis: {:?}",
            POSE_CHANNELS, shape
        )));
    };
    if data.len() < candidates * POSE_CHANNELS {
        return Err(VisionError::Model(format!(
            "Pose output holds {} values, shape {:?} needs {}",
            data.len(),
            shape,
            candidates * POSE_CHANNELS
        )));
    }

    let value = |candidate: usize, channel: usize| -> f32 {
        if channel_major {
            data[channel * candidates + candidate]
        } else {
            data[candidate * POSE_CHANNELS + channel]
        }
    };

    let input = params.input_size as f32;
    let sx = params.frame_width / input;
    let sy = params.frame_height / input;

    let mut people = Vec::new();
    for i in 0..candidates {
        let confidence = value(i, 4);
        if !confidence.is_finite() || confidence < params.confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (value(i, 0), value(i, 1), value(i, 2), value(i, 3));
        if !(cx.is_finite() && cy.is_finite() && w.is_finite() && h.is_finite()) || w <= 0.0 || h <= 0.0 {
            continue;
        }
        let bbox = BoundingBox::new(
            (cx - w / 2.0) * sx,
            (cy - h / 2.0) * sy,
            (cx + w / 2.0) * sx,
            (cy + h / 2.0) * sy,
        );

        let points = (0..KEYPOINTS)
            .map(|k| {
                let base = 5 + k * 3;
                let (x, y, score) = (value(i, base), value(i, base + 1), value(i, base + 2));
                if score >= params.keypoint_confidence && x.is_finite() && y.is_finite() {
                    Point::new(x * sx, y * sy)
                } else {
                    Point::ORIGIN
                }
            })
            .collect();

        people.push(Person {
            keypoints: KeypointSet::new(points),
            bbox: Some(bbox),
            confidence,
        });
    }

    let mut kept = non_max_suppression(people, params.iou_threshold);
    kept.truncate(params.max_detections);
    Ok(kept)
}

/// Greedy NMS; the result is sorted by confidence, highest first.
fn non_max_suppression(mut people: Vec<Person>, iou_threshold: f32) -> Vec<Person> {
    people.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut suppressed = vec![false; people.len()];
    for i in 0..people.len() {
        if suppressed[i] {
            continue;
        }
        for j in (i + 1)..people.len() {
            if suppressed[j] {
                continue;
            }
            if let (Some(a), Some(b)) = (&people[i].bbox, &people[j].bbox) {
                if compute_iou(a, b) > iou_threshold {
                    suppressed[j] = true;
                }
            }
        }
    }

    people
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !suppressed[*i])
        .map(|(_, p)| p)
        .collect()
}

fn compute_iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let inter_w = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let inter_h = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    let inter = inter_w * inter_h;
    if inter <= 0.0 {
        return 0.0;
    }

    let union = a.width() * a.height() + b.width() * b.height() - inter;
    if union <= 0.0 || !union.is_finite() {
        return 0.0;
    }
    (inter / union).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> DecodeParams {
        DecodeParams {
            input_size: 640,
            frame_width: 1280.0,
            frame_height: 720.0,
            confidence_threshold: 0.3,
            keypoint_confidence: 0.5,
            iou_threshold: 0.45,
            max_detections: 100,
        }
    }

    /// One candidate row: box, score and keypoints all at the box center
    fn candidate(cx: f32, cy: f32, w: f32, h: f32, score: f32, kp_score: f32) -> Vec<f32> {
        let mut row = vec![cx, cy, w, h, score];
        for _ in 0..KEYPOINTS {
            row.extend_from_slice(&[cx, cy, kp_score]);
        }
        row
    }

    fn channel_major(rows: &[Vec<f32>]) -> (Vec<f32>, Vec<i64>) {
        let n = rows.len();
        let mut data = vec![0.0; POSE_CHANNELS * n];
        for (i, row) in rows.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                data[c * n + i] = *v;
            }
        }
        (data, vec![1, POSE_CHANNELS as i64, n as i64])
    }

    #[test]
    fn test_decode_scales_to_frame() {
        let (data, shape) = channel_major(&[candidate(320.0, 320.0, 100.0, 200.0, 0.9, 0.8)]);
        let people = decode_predictions(&data, &shape, &params()).unwrap();
        assert_eq!(people.len(), 1);

        let bbox = people[0].bbox.unwrap();
        assert_eq!(bbox.x1, 270.0 * 2.0);
        assert_eq!(bbox.x2, 370.0 * 2.0);
        assert_eq!(bbox.y1, 220.0 * 1.125);
        assert_eq!(bbox.y2, 420.0 * 1.125);
        assert_eq!(people[0].keypoints.len(), KEYPOINTS);
        assert_eq!(people[0].keypoints.get(10), Some(Point::new(640.0, 360.0)));
    }

    #[test]
    fn test_decode_row_major_layout() {
        let data = candidate(320.0, 320.0, 100.0, 200.0, 0.9, 0.8);
        let people = decode_predictions(&data, &[1, 1, POSE_CHANNELS as i64], &params()).unwrap();
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].confidence, 0.9);
    }

    #[test]
    fn test_low_confidence_keypoints_are_undetected() {
        let (data, shape) = channel_major(&[candidate(320.0, 320.0, 100.0, 200.0, 0.9, 0.2)]);
        let people = decode_predictions(&data, &shape, &params()).unwrap();
        assert!(people[0].keypoints.iter().all(|p| !p.is_detected()));
        assert!(people[0].bbox.is_some());
    }

    #[test]
    fn test_weak_people_dropped() {
        let (data, shape) = channel_major(&[candidate(320.0, 320.0, 100.0, 200.0, 0.1, 0.9)]);
        assert!(decode_predictions(&data, &shape, &params()).unwrap().is_empty());
    }

    #[test]
    fn test_overlapping_people_suppressed_and_sorted() {
        let (data, shape) = channel_major(&[
            candidate(100.0, 100.0, 80.0, 160.0, 0.6, 0.9),
            candidate(102.0, 100.0, 80.0, 160.0, 0.8, 0.9),
            candidate(500.0, 300.0, 80.0, 160.0, 0.95, 0.9),
        ]);
        let people = decode_predictions(&data, &shape, &params()).unwrap();
        let scores: Vec<f32> = people.iter().map(|p| p.confidence).collect();
        assert_eq!(scores, vec![0.95, 0.8]);
    }

    #[test]
    fn test_max_detections_caps_output() {
        let rows: Vec<Vec<f32>> = (0..5)
            .map(|i| candidate(50.0 + i as f32 * 120.0, 100.0, 60.0, 60.0, 0.5 + i as f32 * 0.1, 0.9))
            .collect();
        let (data, shape) = channel_major(&rows);
        let mut p = params();
        p.max_detections = 2;
        let people = decode_predictions(&data, &shape, &p).unwrap();
        assert_eq!(people.len(), 2);
        assert!(people[0].confidence > people[1].confidence);
    }

    #[test]
    fn test_bad_shape_rejected() {
        assert!(decode_predictions(&[], &[1, 85, 10], &params()).is_err());
        assert!(decode_predictions(&[0.0; 56], &[1, 56, 2], &params()).is_err());
        assert!(decode_predictions(&[], &[56, 1], &params()).is_err());
    }

    #[test]
    fn test_compute_iou() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 0.0, 15.0, 10.0);
        assert!((compute_iou(&a, &b) - 50.0 / 150.0).abs() < 1e-6);
        assert_eq!(compute_iou(&a, &BoundingBox::new(20.0, 20.0, 30.0, 30.0)), 0.0);
        assert_eq!(compute_iou(&a, &a), 1.0);
    }
}
