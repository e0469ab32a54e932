//! Error types for limbwatch-eye

use limbwatch_core::MonitorError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Cannot open video {path:?}: {reason}")]
    StreamOpen { path: PathBuf, reason: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ONNX Runtime error: {0}")]
    Ort(String),

    #[error("OpenCV error: {0}")]
    OpenCv(String),

    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),
}

impl VisionError {
    pub fn stream_open(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        VisionError::StreamOpen { path: path.into(), reason: reason.into() }
    }

    /// Process exit status for this failure: 2 for unreadable input, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            VisionError::StreamOpen { .. } => 2,
            _ => 1,
        }
    }
}

impl From<VisionError> for MonitorError {
    fn from(err: VisionError) -> Self {
        match err {
            VisionError::Monitor(inner) => inner,
            other => MonitorError::Model(format!("Vision error: {}", other)),
        }
    }
}

impl From<opencv::Error> for VisionError {
    fn from(err: opencv::Error) -> Self {
        VisionError::OpenCv(err.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vision_error_display() {
        let err = VisionError::stream_open("/tmp/missing.mp4", "no such file");
        assert!(err.to_string().contains("Cannot open video"));
        assert!(err.to_string().contains("missing.mp4"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(VisionError::stream_open("x", "y").exit_code(), 2);
        assert_eq!(VisionError::Decode("eof".to_string()).exit_code(), 1);
        assert_eq!(VisionError::Ort("load".to_string()).exit_code(), 1);
    }

    #[test]
    fn test_vision_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let vision_err: VisionError = io_err.into();
        match vision_err {
            VisionError::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_vision_error_to_monitor_error() {
        let err: MonitorError = VisionError::Ort("session".to_string()).into();
        match err {
            MonitorError::Model(msg) => {
                assert!(msg.contains("Vision error"));
                assert!(msg.contains("session"));
            }
            _ => panic!("Expected Model error"),
        }
    }

    #[test]
    fn test_monitor_error_round_trips() {
        let err: VisionError = MonitorError::Render("canvas".to_string()).into();
        let back: MonitorError = err.into();
        assert!(matches!(back, MonitorError::Render(_)));
    }
}
