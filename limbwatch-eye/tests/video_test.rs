//! Video round trips through OpenCV's built-in MJPEG container

use limbwatch_core::types::landmark;
use limbwatch_core::{KeypointSet, MonitorConfig, MonitorError, Person, Point, PoseDetection, PoseModel, ProgressEvent};
use limbwatch_eye::pipeline::annotate;
use limbwatch_eye::{FrameFeed, VideoSink, VideoSource, VisionConfig, VisionError};
use opencv::core::{Mat, Scalar, Size, CV_8UC3};
use opencv::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const WIDTH: i32 = 64;
const HEIGHT: i32 = 48;

fn write_clip(path: &Path, frames: usize, fps: u32) {
    let mut sink = VideoSink::create(path, ['M', 'J', 'P', 'G'], fps, Size::new(WIDTH, HEIGHT)).unwrap();
    for i in 0..frames {
        let shade = (i * 8 % 256) as f64;
        let frame = Mat::new_rows_cols_with_default(HEIGHT, WIDTH, CV_8UC3, Scalar::all(shade)).unwrap();
        sink.write(&frame).unwrap();
    }
    sink.release().unwrap();
}

fn mjpeg() -> VisionConfig {
    VisionConfig { fourcc: "MJPG".to_string(), ..VisionConfig::default() }
}

/// Moves the right wrist 600 px every frame
struct JumpingWrist {
    frame: usize,
}

impl PoseModel for JumpingWrist {
    type Frame = Mat;

    fn infer(&mut self, _frame: &Mat) -> Result<PoseDetection, MonitorError> {
        let mut points = vec![Point::ORIGIN; landmark::COUNT];
        points[landmark::RIGHT_WRIST] = Point::new(10.0 + 600.0 * (self.frame % 2) as f32, 20.0);
        self.frame += 1;
        Ok(PoseDetection {
            people: vec![Person { keypoints: KeypointSet::new(points), bbox: None, confidence: 0.9 }],
        })
    }
}

/// Fails once `remaining` frames have been inferred
struct FailingModel {
    remaining: usize,
}

impl PoseModel for FailingModel {
    type Frame = Mat;

    fn infer(&mut self, _frame: &Mat) -> Result<PoseDetection, MonitorError> {
        if self.remaining == 0 {
            return Err(MonitorError::Model("inference backend lost".to_string()));
        }
        self.remaining -= 1;
        Ok(PoseDetection::empty())
    }
}

#[test]
fn test_missing_file_is_stream_open() {
    let dir = TempDir::new().unwrap();
    let err = VideoSource::open(&dir.path().join("absent.avi"), 25).err().unwrap();
    assert!(matches!(err, VisionError::StreamOpen { .. }));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_garbage_file_is_stream_open() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("noise.avi");
    std::fs::write(&path, b"definitely not a video").unwrap();
    let err = VideoSource::open(&path, 25).err().unwrap();
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_written_clip_reads_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clip.avi");
    write_clip(&path, 10, 25);

    let mut source = VideoSource::open(&path, 30).unwrap();
    assert_eq!(source.fps(), 25);
    assert_eq!(source.frame_size(), Size::new(WIDTH, HEIGHT));

    let mut frames = 0;
    while let Some(frame) = source.read().unwrap() {
        assert_eq!(frame.cols(), WIDTH);
        frames += 1;
    }
    assert_eq!(frames, 10);
    assert!(source.read().unwrap().is_none());
}

#[test]
fn test_prefetched_feed_matches_inline() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clip.avi");
    write_clip(&path, 12, 25);

    let count = |depth: usize| {
        let mut feed = FrameFeed::new(VideoSource::open(&path, 25).unwrap(), depth).unwrap();
        let mut n = 0;
        while feed.next_frame().unwrap().is_some() {
            n += 1;
        }
        n
    };
    assert_eq!(count(0), 12);
    assert_eq!(count(4), 12);
}

#[test]
fn test_prefetched_feed_dropped_early() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clip.avi");
    write_clip(&path, 20, 25);

    let mut feed = FrameFeed::new(VideoSource::open(&path, 25).unwrap(), 2).unwrap();
    assert!(feed.next_frame().unwrap().is_some());
    drop(feed);
}

#[test]
fn test_annotate_reports_alert_and_heartbeat() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.avi");
    let output = dir.path().join("out.avi");
    write_clip(&input, 30, 25);

    let mut lines = Vec::new();
    let summary = annotate(
        VideoSource::open(&input, 25).unwrap(),
        &output,
        JumpingWrist { frame: 0 },
        &MonitorConfig::default(),
        &mjpeg(),
        &mut |event: &ProgressEvent| lines.push(event.to_string()),
    )
    .unwrap();

    assert_eq!(summary.frames, 30);
    assert_eq!(summary.frames_with_detection, 30);
    assert_eq!(summary.alerts, 1);
    assert_eq!(summary.alert_frames, 29);
    assert_eq!(summary.evidence_frames, 1);
    assert!(lines.iter().any(|l| l.starts_with("[alert] Right Arm speed=")));
    assert!(lines.contains(&"[progress] frame=25".to_string()));
    assert_eq!(lines.last().map(String::as_str), Some(format!("[done] saved={}", output.display()).as_str()));

    let written = VideoSource::open(&output, 25).unwrap();
    assert_eq!(written.frame_size(), Size::new(WIDTH, HEIGHT));
}

#[test]
fn test_failed_run_removes_partial_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.avi");
    let output = dir.path().join("out.avi");
    write_clip(&input, 10, 25);

    let mut lines = Vec::new();
    let err = annotate(
        VideoSource::open(&input, 25).unwrap(),
        &output,
        FailingModel { remaining: 3 },
        &MonitorConfig::default(),
        &mjpeg(),
        &mut |event: &ProgressEvent| lines.push(event.to_string()),
    )
    .unwrap_err();

    assert!(matches!(err, VisionError::Monitor(MonitorError::Model(_))));
    assert_eq!(err.exit_code(), 1);
    assert!(!output.exists());
    assert!(lines.iter().all(|l| !l.starts_with("[done]")));
}
