//! limbwatch-core: per-frame limb motion analysis
//!
//! Tracks limb positions across frames, turns displacement into a
//! noise-gated, smoothed speed, and drives the alert state machine that
//! decides when a frame is annotated as violent action.
//!
//! Nothing in this crate touches video or model files. The pose model and
//! the drawing surface are reached through the [`PoseModel`] and
//! [`Canvas`] traits so the whole state machine runs in plain unit tests.

pub mod alert;
pub mod clock;
pub mod config;
pub mod error;
pub mod evidence;
pub mod locator;
pub mod monitor;
pub mod overlay;
pub mod progress;
pub mod types;
pub mod velocity;

#[cfg(test)]
pub(crate) mod testing;

pub use alert::{AlertPolicy, AlertState};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{LimbDefinition, MonitorConfig};
pub use error::{MonitorError, Result};
pub use evidence::EvidenceBuffer;
pub use monitor::{
    AlertEvent, Analysis, FrameAnalyzer, FrameReport, LimbSpeed, Monitor, PoseModel, RunState,
    RunSummary,
};
pub use overlay::{Canvas, Color, OverlayRenderer, OverlayStyle};
pub use progress::ProgressEvent;
pub use types::{BoundingBox, EntityId, KeypointSet, Person, Point, PoseDetection};
