//! Skeleton and alert overlay

use crate::alert::AlertState;
use crate::error::Result;
use crate::types::{landmark, BoundingBox, KeypointSet, Point};

/// Color in OpenCV channel order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub b: u8,
    pub g: u8,
    pub r: u8,
}

impl Color {
    pub const BLUE: Color = Color { b: 255, g: 0, r: 0 };
    pub const RED: Color = Color { b: 0, g: 0, r: 255 };

    pub const fn bgr(b: u8, g: u8, r: u8) -> Self {
        Self { b, g, r }
    }
}

/// Drawing surface a frame exposes to the renderer
pub trait Canvas {
    /// Filled circle
    fn circle(&mut self, center: Point, radius: i32, color: Color) -> Result<()>;

    fn line(&mut self, from: Point, to: Point, color: Color, thickness: i32) -> Result<()>;

    /// Rectangle outline
    fn rectangle(&mut self, bbox: &BoundingBox, color: Color, thickness: i32) -> Result<()>;

    /// Text with its baseline starting at `origin`
    fn text(&mut self, text: &str, origin: Point, scale: f64, color: Color, thickness: i32) -> Result<()>;
}

/// Bones drawn between keypoints, one pair per side plus the two crossbars
pub const SKELETON: [(usize, usize); 6] = [
    (landmark::LEFT_SHOULDER, landmark::LEFT_ELBOW),
    (landmark::LEFT_ELBOW, landmark::LEFT_WRIST),
    (landmark::RIGHT_SHOULDER, landmark::RIGHT_ELBOW),
    (landmark::RIGHT_ELBOW, landmark::RIGHT_WRIST),
    (landmark::LEFT_SHOULDER, landmark::RIGHT_SHOULDER),
    (landmark::LEFT_HIP, landmark::RIGHT_HIP),
];

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStyle {
    pub skeleton_color: Color,
    pub marker_radius: i32,
    pub bone_thickness: i32,
    pub alert_color: Color,
    pub box_thickness: i32,
    pub label: String,
    pub label_origin: Point,
    pub label_scale: f64,
    pub label_thickness: i32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            skeleton_color: Color::BLUE,
            marker_radius: 5,
            bone_thickness: 2,
            alert_color: Color::RED,
            box_thickness: 4,
            label: "VIOLENT ACTION DETECTED!".to_string(),
            label_origin: Point::new(50.0, 100.0),
            label_scale: 2.0,
            label_thickness: 5,
        }
    }
}

impl OverlayStyle {
    pub fn with_label(label: impl Into<String>) -> Self {
        Self { label: label.into(), ..Self::default() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OverlayRenderer {
    style: OverlayStyle,
}

impl OverlayRenderer {
    pub fn new(style: OverlayStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    /// Draw the frame's overlay. Returns whether the alert overlay was drawn.
    pub fn render<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        keypoints: Option<&KeypointSet>,
        alert: &AlertState,
    ) -> Result<bool> {
        if let Some(keypoints) = keypoints {
            self.draw_skeleton(canvas, keypoints)?;
        }
        if !alert.is_alerting() {
            return Ok(false);
        }
        self.draw_alert(canvas, alert)?;
        Ok(true)
    }

    pub fn draw_skeleton<C: Canvas + ?Sized>(&self, canvas: &mut C, keypoints: &KeypointSet) -> Result<()> {
        let style = &self.style;
        for point in keypoints.iter().filter(|p| p.is_detected()) {
            canvas.circle(*point, style.marker_radius, style.skeleton_color)?;
        }
        for (a, b) in SKELETON {
            if let (Some(from), Some(to)) = (keypoints.detected(a), keypoints.detected(b)) {
                canvas.line(from, to, style.skeleton_color, style.bone_thickness)?;
            }
        }
        Ok(())
    }

    fn draw_alert<C: Canvas + ?Sized>(&self, canvas: &mut C, alert: &AlertState) -> Result<()> {
        let style = &self.style;
        if let Some(bbox) = alert.display_box() {
            canvas.rectangle(&bbox, style.alert_color, style.box_thickness)?;
        }
        canvas.text(&style.label, style.label_origin, style.label_scale, style.alert_color, style.label_thickness)
    }
}
