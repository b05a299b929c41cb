use image::RgbImage;

use crate::error::{Error, Result};

/// Memory order of an image buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    /// (height, width, channel), as stored in the dataset
    Hwc,
    /// (channel, height, width), as produced by the generator
    Chw,
}

/// Map a value in [-1, 1] to a display byte
#[inline]
pub fn make_uint8(value: f32) -> u8 {
    ((value + 1.0) * 0.5 * 255.0).clamp(0.0, 255.0).round() as u8
}

/// Convert a 3-channel float image into an RGB frame
pub fn to_rgb_image(
    values: &[f32],
    layout: PixelLayout,
    height: usize,
    width: usize,
) -> Result<RgbImage> {
    let plane = height * width;
    if values.len() != plane * 3 {
        return Err(Error::RenderError(format!(
            "Expected {} values for a {}x{} RGB image, got {}",
            plane * 3,
            height,
            width,
            values.len()
        )));
    }

    let bytes: Vec<u8> = match layout {
        PixelLayout::Hwc => values.iter().copied().map(make_uint8).collect(),
        PixelLayout::Chw => (0..plane)
            .flat_map(|pixel| (0..3).map(move |channel| channel * plane + pixel))
            .map(|index| make_uint8(values[index]))
            .collect(),
    };

    RgbImage::from_raw(width as u32, height as u32, bytes)
        .ok_or_else(|| Error::RenderError("Frame buffer size mismatch".to_string()))
}
