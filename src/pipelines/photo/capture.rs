// SPDX-License-Identifier: MPL-2.0

//! Frame grabbing and rasterization
//!
//! A capture draws exactly one frame of the stream into an offscreen bitmap
//! sized to the stream's reported dimensions.

use crate::backends::camera::MediaStream;
use crate::backends::camera::types::CameraFrame;
use crate::constants::FALLBACK_CAPTURE_SIZE;
use crate::errors::PhotoError;
use image::RgbaImage;
use image::imageops::{self, FilterType};
use tracing::debug;

/// Photo capture handler
pub struct PhotoCapture;

impl PhotoCapture {
    /// Size of the bitmap a capture produces
    ///
    /// Streams that cannot (or not yet) report a size, or report zero,
    /// capture at 640x480.
    pub fn target_size(stream: &dyn MediaStream) -> (u32, u32) {
        match stream.video_dimensions() {
            Some((w, h)) if w > 0 && h > 0 => (w, h),
            _ => FALLBACK_CAPTURE_SIZE,
        }
    }

    /// Grab the current frame and rasterize it
    ///
    /// # Returns
    /// * `Ok(RgbaImage)` - Bitmap of exactly the target size
    /// * `Err(PhotoError::NoFrameAvailable)` - The stream has no frame yet
    pub fn grab(stream: &dyn MediaStream) -> Result<RgbaImage, PhotoError> {
        let (width, height) = Self::target_size(stream);
        let frame = stream.latest_frame().ok_or(PhotoError::NoFrameAvailable)?;

        debug!(
            frame_width = frame.width,
            frame_height = frame.height,
            width,
            height,
            "Rasterizing frame"
        );

        Self::rasterize(&frame, width, height)
    }

    /// Draw a frame into a `width` x `height` bitmap, scaling if needed
    pub fn rasterize(frame: &CameraFrame, width: u32, height: u32) -> Result<RgbaImage, PhotoError> {
        let source = RgbaImage::from_raw(frame.width, frame.height, frame.to_packed_rgba())
            .ok_or(PhotoError::NoFrameAvailable)?;

        if (frame.width, frame.height) == (width, height) {
            return Ok(source);
        }

        Ok(imageops::resize(&source, width, height, FilterType::Triangle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::FacingMode;
    use crate::backends::virtual_camera::test_pattern;

    #[test]
    fn test_rasterize_keeps_matching_size() {
        let frame = test_pattern(64, 48, FacingMode::Environment);
        let bitmap = PhotoCapture::rasterize(&frame, 64, 48).unwrap();
        assert_eq!(bitmap.dimensions(), (64, 48));
        assert_eq!(bitmap.get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_rasterize_scales_to_target() {
        let frame = test_pattern(32, 24, FacingMode::User);
        let bitmap = PhotoCapture::rasterize(&frame, 64, 48).unwrap();
        assert_eq!(bitmap.dimensions(), (64, 48));
    }

    #[test]
    fn test_rasterize_rejects_short_buffer() {
        let frame = CameraFrame::from_rgba(4, 4, vec![0; 8]);
        assert_eq!(
            PhotoCapture::rasterize(&frame, 4, 4),
            Err(PhotoError::NoFrameAvailable)
        );
    }
}
