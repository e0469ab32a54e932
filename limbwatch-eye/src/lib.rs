//! limbwatch-eye: video and pose-model adapters for limbwatch-core
//!
//! Decodes a video file with OpenCV, runs a YOLOv8-pose ONNX model on every
//! frame, lets the core monitor annotate the frame in place, and encodes
//! the result to a new file.

pub mod canvas;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod video;
mod utils;

pub use config::VisionConfig;
pub use error::VisionError;
pub use models::YoloPoseModel;
pub use pipeline::run_video;
pub use video::{FrameFeed, VideoSink, VideoSource};
