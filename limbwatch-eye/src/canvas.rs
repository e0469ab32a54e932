//! OpenCV drawing backend for the core overlay

use limbwatch_core::{BoundingBox, Canvas, Color, MonitorError, Point};
use opencv::{
    core::{Mat, Point as CvPoint, Rect, Scalar},
    imgproc,
};

fn scalar(color: Color) -> Scalar {
    Scalar::new(f64::from(color.b), f64::from(color.g), f64::from(color.r), 0.0)
}

fn pixel(point: Point) -> CvPoint {
    CvPoint::new(point.x as i32, point.y as i32)
}

fn render_err(err: opencv::Error) -> MonitorError {
    MonitorError::Render(err.message)
}

impl Canvas for Mat {
    fn circle(&mut self, center: Point, radius: i32, color: Color) -> Result<(), MonitorError> {
        imgproc::circle(self, pixel(center), radius, scalar(color), imgproc::FILLED, imgproc::LINE_8, 0)
            .map_err(render_err)
    }

    fn line(&mut self, from: Point, to: Point, color: Color, thickness: i32) -> Result<(), MonitorError> {
        imgproc::line(self, pixel(from), pixel(to), scalar(color), thickness, imgproc::LINE_8, 0)
            .map_err(render_err)
    }

    fn rectangle(&mut self, bbox: &BoundingBox, color: Color, thickness: i32) -> Result<(), MonitorError> {
        let rect = Rect::new(
            bbox.x1 as i32,
            bbox.y1 as i32,
            bbox.width().max(0.0) as i32,
            bbox.height().max(0.0) as i32,
        );
        imgproc::rectangle(self, rect, scalar(color), thickness, imgproc::LINE_8, 0).map_err(render_err)
    }

    fn text(&mut self, text: &str, origin: Point, scale: f64, color: Color, thickness: i32) -> Result<(), MonitorError> {
        imgproc::put_text(
            self,
            text,
            pixel(origin),
            imgproc::FONT_HERSHEY_SIMPLEX,
            scale,
            scalar(color),
            thickness,
            imgproc::LINE_8,
            false,
        )
        .map_err(render_err)
    }
}
