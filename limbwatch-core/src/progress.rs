//! Operator-facing progress lines
//!
//! These lines are a stable contract for tooling that wraps the binary, so
//! they are kept apart from `tracing` output.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Started { input: PathBuf, output: PathBuf },
    Heartbeat { frame: u64 },
    Alert { limb: String, speed: f64, threshold: f64 },
    Finished { output: PathBuf },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::Started { input, output } => {
                write!(f, "[start] input={} output={}", input.display(), output.display())
            }
            ProgressEvent::Heartbeat { frame } => write!(f, "[progress] frame={}", frame),
            ProgressEvent::Alert { limb, speed, threshold } => {
                write!(f, "[alert] {} speed={:.1} > {}", limb, speed, threshold)
            }
            ProgressEvent::Finished { output } => write!(f, "[done] saved={}", output.display()),
        }
    }
}
