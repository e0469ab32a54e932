//! Utility functions for vision processing

use crate::error::VisionError;
use opencv::{
    core::{self, Mat, Size, Vec3f},
    imgproc,
    prelude::*,
};

/// Resize a BGR frame to `size`×`size`, convert to RGB in [0, 1] and lay it
/// out as a CHW float tensor.
pub fn mat_to_chw_tensor(frame: &Mat, size: u32) -> Result<Vec<f32>, VisionError> {
    if size == 0 {
        return Err(VisionError::Model("Target size cannot be zero".to_string()));
    }
    if frame.cols() <= 0 || frame.rows() <= 0 {
        return Err(VisionError::Decode("Frame has no pixels".to_string()));
    }
    if frame.channels() != 3 {
        return Err(VisionError::Decode(format!("Expected 3 channels, got {}", frame.channels())));
    }

    let edge = size as i32;
    let mut resized = Mat::default();
    imgproc::resize(frame, &mut resized, Size::new(edge, edge), 0.0, 0.0, imgproc::INTER_LINEAR)?;

    let mut rgb = Mat::default();
    imgproc::cvt_color(&resized, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

    let mut float_mat = Mat::default();
    rgb.convert_to(&mut float_mat, core::CV_32FC3, 1.0 / 255.0, 0.0)?;
    if !float_mat.is_continuous() {
        float_mat = float_mat.try_clone()?;
    }

    let pixels = float_mat.data_typed::<Vec3f>()?;
    let plane = (size * size) as usize;
    if pixels.len() != plane {
        return Err(VisionError::Model(format!(
            "Resized frame has {} pixels, expected {}",
            pixels.len(),
            plane
        )));
    }

    let mut chw = vec![0.0f32; 3 * plane];
    for (i, px) in pixels.iter().enumerate() {
        chw[i] = px[0];
        chw[plane + i] = px[1];
        chw[2 * plane + i] = px[2];
    }
    Ok(chw)
}
