//! Test doubles shared by unit tests

use crate::error::Result;
use crate::overlay::{Canvas, Color};
use crate::types::{BoundingBox, Point};

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Circle(Point),
    Line(Point, Point),
    Rect(BoundingBox),
    Text(String),
}

/// Frame stand-in that records what was drawn on it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingFrame {
    pub id: u32,
    pub ops: Vec<DrawOp>,
}

impl RecordingFrame {
    pub fn numbered(id: u32) -> Self {
        Self { id, ops: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&DrawOp) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }
}

impl Canvas for RecordingFrame {
    fn circle(&mut self, center: Point, _radius: i32, _color: Color) -> Result<()> {
        self.ops.push(DrawOp::Circle(center));
        Ok(())
    }

    fn line(&mut self, from: Point, to: Point, _color: Color, _thickness: i32) -> Result<()> {
        self.ops.push(DrawOp::Line(from, to));
        Ok(())
    }

    fn rectangle(&mut self, bbox: &BoundingBox, _color: Color, _thickness: i32) -> Result<()> {
        self.ops.push(DrawOp::Rect(*bbox));
        Ok(())
    }

    fn text(&mut self, text: &str, _origin: Point, _scale: f64, _color: Color, _thickness: i32) -> Result<()> {
        self.ops.push(DrawOp::Text(text.to_string()));
        Ok(())
    }
}
