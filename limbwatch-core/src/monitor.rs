//! Per-frame run loop
//!
//! [`FrameAnalyzer`] is the pure analysis step: given the run state, one
//! detection and the raw frame it locates every limb, estimates its speed
//! and evaluates the alert state machine. [`Monitor`] wraps it with the
//! pose model, the overlay and the countdown tick, in that order:
//!
//! infer → locate → estimate → evaluate → render → tick

use crate::alert::{AlertPolicy, AlertState};
use crate::clock::{Clock, SystemClock};
use crate::config::{LimbDefinition, MonitorConfig};
use crate::error::{MonitorError, Result};
use crate::evidence::EvidenceBuffer;
use crate::locator::{self, LocateContext, SampleSource, TrackingState};
use crate::overlay::{Canvas, OverlayRenderer, OverlayStyle};
use crate::types::{EntityId, PoseDetection};
use crate::velocity::VelocityEstimator;
use tracing::{debug, info};

/// External pose estimator, called once per frame
#[cfg_attr(test, mockall::automock(type Frame = crate::testing::RecordingFrame;))]
pub trait PoseModel {
    type Frame;

    fn infer(&mut self, frame: &Self::Frame) -> Result<PoseDetection>;
}

/// Everything that persists from one frame to the next
#[derive(Debug, Clone)]
pub struct RunState<F> {
    pub tracking: TrackingState,
    pub alert: AlertState,
    pub evidence: EvidenceBuffer<F>,
}

impl<F> RunState<F> {
    pub fn new(evidence_capacity: usize) -> Self {
        Self {
            tracking: TrackingState::new(),
            alert: AlertState::new(),
            evidence: EvidenceBuffer::new(evidence_capacity),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LimbSpeed {
    pub limb: String,
    pub speed: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub limb: String,
    pub speed: f64,
}

/// Result of analyzing one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    pub detected: bool,
    pub speeds: Vec<LimbSpeed>,
    pub alerts: Vec<AlertEvent>,
}

/// Locate, estimate and evaluate for one frame
#[derive(Debug, Clone)]
pub struct FrameAnalyzer {
    limbs: Vec<LimbDefinition>,
    estimator: VelocityEstimator,
    policy: AlertPolicy,
    interval_secs: f64,
}

impl FrameAnalyzer {
    pub fn new(config: &MonitorConfig, fps: u32) -> Self {
        Self {
            limbs: config.limbs.clone(),
            estimator: VelocityEstimator::from_config(config),
            policy: AlertPolicy::from_config(config, fps),
            interval_secs: 1.0 / f64::from(fps),
        }
    }

    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    pub fn analyze<F: Clone, K: Clock + ?Sized>(
        &self,
        state: &mut RunState<F>,
        detection: &PoseDetection,
        frame: &F,
        clock: &K,
    ) -> Analysis {
        let Some(person) = detection.primary() else {
            return Analysis::default();
        };

        let current = &person.keypoints;
        let previous = state
            .tracking
            .previous_keypoints()
            .cloned()
            .unwrap_or_else(|| current.clone());
        let ctx = LocateContext {
            entity: EntityId::PRIMARY,
            current,
            previous: &previous,
            bbox: person.bbox,
        };

        let mut analysis = Analysis { detected: true, ..Analysis::default() };

        for limb in &self.limbs {
            let Some(sample) = locator::locate(limb, &ctx, &state.tracking) else {
                continue;
            };
            // Later limbs falling back in this frame see the updated center.
            if let SampleSource::BoxCenter(entity) = sample.source {
                state.tracking.record_box_center(entity, sample.current);
            }

            let Some(speed) = self.estimator.estimate(
                &limb.name,
                sample.current,
                sample.previous,
                self.interval_secs,
                &mut state.tracking,
            ) else {
                continue;
            };
            debug!("{} speed {:.1} px/s via {:?}", limb.name, speed, sample.source);
            analysis.speeds.push(LimbSpeed { limb: limb.name.clone(), speed });

            if state.alert.evaluate(&self.policy, speed, || clock.now(), person.bbox) {
                info!(limb = %limb.name, speed, threshold = self.policy.threshold, "Alert triggered");
                state.evidence.push(frame.clone());
                analysis.alerts.push(AlertEvent { limb: limb.name.clone(), speed });
            }
        }

        state.tracking.commit_keypoints(current.clone());

        analysis
    }
}

/// What happened to one processed frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// 1-based index of the frame in the stream
    pub index: u64,
    pub analysis: Analysis,
    /// Whether the alert overlay was drawn on this frame
    pub alert_overlay: bool,
    /// Roughly once per second of video
    pub heartbeat: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub frames_with_detection: u64,
    pub alerts: u64,
    pub alert_frames: u64,
    /// Frames currently held in the evidence buffer
    pub evidence_frames: u64,
}

/// Drives the pose model and the analysis state for a whole stream
pub struct Monitor<M: PoseModel, K: Clock = SystemClock> {
    model: M,
    clock: K,
    fps: u32,
    analyzer: FrameAnalyzer,
    renderer: OverlayRenderer,
    state: RunState<M::Frame>,
    summary: RunSummary,
}

impl<M> Monitor<M, SystemClock>
where
    M: PoseModel,
    M::Frame: Canvas + Clone,
{
    pub fn new(model: M, config: &MonitorConfig, fps: u32) -> Result<Self> {
        Self::with_clock(model, SystemClock, config, fps)
    }
}

impl<M, K> Monitor<M, K>
where
    M: PoseModel,
    M::Frame: Canvas + Clone,
    K: Clock,
{
    pub fn with_clock(model: M, clock: K, config: &MonitorConfig, fps: u32) -> Result<Self> {
        config.validate().map_err(MonitorError::Config)?;
        if fps == 0 {
            return Err(MonitorError::Config("Frame rate must be positive".to_string()));
        }

        Ok(Self {
            model,
            clock,
            fps,
            analyzer: FrameAnalyzer::new(config, fps),
            renderer: OverlayRenderer::new(OverlayStyle::with_label(config.warning_label.clone())),
            state: RunState::new(config.evidence_capacity),
            summary: RunSummary::default(),
        })
    }

    /// Analyze and annotate one frame in place.
    pub fn process_frame(&mut self, frame: &mut M::Frame) -> Result<FrameReport> {
        self.summary.frames += 1;
        let index = self.summary.frames;

        let detection = self.model.infer(frame)?;
        let analysis = self.analyzer.analyze(&mut self.state, &detection, frame, &self.clock);

        let keypoints = detection.primary().map(|p| &p.keypoints);
        let alert_overlay = self.renderer.render(frame, keypoints, &self.state.alert)?;
        self.state.alert.tick();

        if analysis.detected {
            self.summary.frames_with_detection += 1;
        }
        self.summary.alerts += analysis.alerts.len() as u64;
        if alert_overlay {
            self.summary.alert_frames += 1;
        }

        Ok(FrameReport {
            index,
            analysis,
            alert_overlay,
            heartbeat: index % u64::from(self.fps) == 0,
        })
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn threshold(&self) -> f64 {
        self.analyzer.policy().threshold
    }

    pub fn state(&self) -> &RunState<M::Frame> {
        &self.state
    }

    pub fn evidence(&self) -> &EvidenceBuffer<M::Frame> {
        &self.state.evidence
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            evidence_frames: self.state.evidence.len() as u64,
            ..self.summary
        }
    }

    pub fn into_state(self) -> RunState<M::Frame> {
        self.state
    }
}
