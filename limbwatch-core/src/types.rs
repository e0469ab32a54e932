//! Pose primitives shared by every stage of the per-frame pipeline

use serde::{Deserialize, Serialize};

/// COCO-17 landmark indices used by the default limb and skeleton tables.
pub mod landmark {
    pub const NOSE: usize = 0;
    pub const LEFT_SHOULDER: usize = 5;
    pub const RIGHT_SHOULDER: usize = 6;
    pub const LEFT_ELBOW: usize = 7;
    pub const RIGHT_ELBOW: usize = 8;
    pub const LEFT_WRIST: usize = 9;
    pub const RIGHT_WRIST: usize = 10;
    pub const LEFT_HIP: usize = 11;
    pub const RIGHT_HIP: usize = 12;

    /// Number of landmarks in the scheme
    pub const COUNT: usize = 17;
}

/// 2D image-space point, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// A point at exactly (0, 0) is how the pose model reports "not detected".
    pub fn is_detected(&self) -> bool {
        self.x != 0.0 || self.y != 0.0
    }

    /// Euclidean distance, computed in f64
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned person box in corner form
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }
}

/// One person's landmarks for one frame, indexed by the COCO-17 scheme
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeypointSet {
    points: Vec<Point>,
}

impl KeypointSet {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Raw point at `index`, including undetected (0, 0) points.
    pub fn get(&self, index: usize) -> Option<Point> {
        self.points.get(index).copied()
    }

    /// Point at `index` only when the model actually detected it.
    pub fn detected(&self, index: usize) -> Option<Point> {
        self.get(index).filter(Point::is_detected)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }
}

impl From<Vec<(f32, f32)>> for KeypointSet {
    fn from(points: Vec<(f32, f32)>) -> Self {
        Self::new(points.into_iter().map(|(x, y)| Point::new(x, y)).collect())
    }
}

/// Identifier of a tracked person.
///
/// Only [`EntityId::PRIMARY`] is produced today: the analyzer always follows
/// the first detection of each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    pub const PRIMARY: EntityId = EntityId(0);
}

/// A detected person
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Person {
    pub keypoints: KeypointSet,
    pub bbox: Option<BoundingBox>,
    pub confidence: f32,
}

/// Everything the pose model reported for one frame, ordered by the model
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PoseDetection {
    pub people: Vec<Person>,
}

impl PoseDetection {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The person the analyzer follows: always the first detection.
    pub fn primary(&self) -> Option<&Person> {
        self.people.first()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }
}
