//! Limb position lookup with box-center fallback
//!
//! A limb is resolved by trying a short, ordered list of sources. The
//! first source that yields a sample wins:
//!
//! 1. the limb's keypoints, in priority order
//! 2. the center of the tracked person's bounding box

use crate::config::LimbDefinition;
use crate::types::{BoundingBox, EntityId, KeypointSet, Point};
use std::collections::HashMap;
use tracing::trace;

/// Where a limb sample came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleSource {
    /// Keypoint at this landmark index
    Keypoint(usize),
    /// Center of this entity's bounding box
    BoxCenter(EntityId),
}

/// Current and previous position of one limb
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimbSample {
    pub current: Point,
    pub previous: Point,
    pub source: SampleSource,
}

/// Per-frame inputs for locating limbs of one entity
#[derive(Debug, Clone, Copy)]
pub struct LocateContext<'a> {
    pub entity: EntityId,
    pub current: &'a KeypointSet,
    pub previous: &'a KeypointSet,
    pub bbox: Option<BoundingBox>,
}

/// State that outlives a single frame
#[derive(Debug, Clone, Default)]
pub struct TrackingState {
    previous_keypoints: Option<KeypointSet>,
    smoothed_speeds: HashMap<String, f64>,
    box_centers: HashMap<EntityId, Point>,
}

impl TrackingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keypoints of the last frame that had a detection
    pub fn previous_keypoints(&self) -> Option<&KeypointSet> {
        self.previous_keypoints.as_ref()
    }

    /// Overwrite the previous keypoints; called once per frame with a detection.
    pub fn commit_keypoints(&mut self, keypoints: KeypointSet) {
        self.previous_keypoints = Some(keypoints);
    }

    pub fn smoothed_speed(&self, limb: &str) -> Option<f64> {
        self.smoothed_speeds.get(limb).copied()
    }

    pub fn set_smoothed_speed(&mut self, limb: &str, speed: f64) {
        match self.smoothed_speeds.get_mut(limb) {
            Some(slot) => *slot = speed,
            None => {
                self.smoothed_speeds.insert(limb.to_string(), speed);
            }
        }
    }

    /// Last box center recorded for `entity` by the fallback path
    pub fn box_center(&self, entity: EntityId) -> Option<Point> {
        self.box_centers.get(&entity).copied()
    }

    pub fn record_box_center(&mut self, entity: EntityId, center: Point) {
        self.box_centers.insert(entity, center);
    }
}

type Attempt = fn(&LimbDefinition, &LocateContext<'_>, &TrackingState) -> Option<LimbSample>;

const ATTEMPTS: [Attempt; 2] = [from_keypoints, from_box_center];

/// Resolve the current and previous position of `limb`, or `None` when
/// neither keypoints nor a box are available.
pub fn locate(
    limb: &LimbDefinition,
    ctx: &LocateContext<'_>,
    tracking: &TrackingState,
) -> Option<LimbSample> {
    let sample = ATTEMPTS.iter().find_map(|attempt| attempt(limb, ctx, tracking));
    if sample.is_none() {
        trace!("No position source for {}", limb.name);
    }
    sample
}

fn from_keypoints(
    limb: &LimbDefinition,
    ctx: &LocateContext<'_>,
    _tracking: &TrackingState,
) -> Option<LimbSample> {
    limb.keypoints.iter().find_map(|&index| {
        let current = ctx.current.detected(index)?;
        // The previous point may itself be undetected; that displacement is used as-is.
        let previous = ctx.previous.get(index).unwrap_or(Point::ORIGIN);
        Some(LimbSample { current, previous, source: SampleSource::Keypoint(index) })
    })
}

fn from_box_center(
    _limb: &LimbDefinition,
    ctx: &LocateContext<'_>,
    tracking: &TrackingState,
) -> Option<LimbSample> {
    let current = ctx.bbox?.center();
    let previous = tracking.box_center(ctx.entity).unwrap_or(current);
    Some(LimbSample { current, previous, source: SampleSource::BoxCenter(ctx.entity) })
}
