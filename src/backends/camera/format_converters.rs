// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion for V4L2 capture buffers
//!
//! Webcams commonly deliver packed YUV 4:2:2 or MJPEG; everything downstream
//! works on packed RGBA.

use image::GenericImageView;

/// Convert YUYV (YUV 4:2:2) to RGBA
///
/// YUYV format: Y0 U0 Y1 V0 - each 4-byte group encodes 2 pixels.
/// Uses BT.601 coefficients for YUV to RGB conversion.
pub fn yuyv_to_rgba(data: &[u8], width: u32, height: u32, stride: u32) -> Vec<u8> {
    let pixel_count = (width * height) as usize;
    let mut rgba = Vec::with_capacity(pixel_count * 4);
    let row_bytes = (width * 2) as usize;
    let stride = (stride as usize).max(row_bytes);

    for row in data.chunks(stride).take(height as usize) {
        let row = &row[..row_bytes.min(row.len())];
        for chunk in row.chunks_exact(4) {
            let y0 = chunk[0];
            let u = chunk[1];
            let y1 = chunk[2];
            let v = chunk[3];

            for y in [y0, y1] {
                let (r, g, b) = yuv_to_rgb(y, u, v);
                rgba.extend_from_slice(&[r, g, b, 255]);
            }
        }
    }

    // Short buffers (truncated frames) are padded black
    rgba.resize(pixel_count * 4, 0);
    rgba
}

/// Decode an MJPEG frame to RGBA
///
/// Returns the decoded dimensions, which may differ from the negotiated
/// ones on some drivers.
pub fn mjpeg_to_rgba(data: &[u8]) -> Result<(Vec<u8>, u32, u32), String> {
    let img = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
        .map_err(|e| format!("MJPEG decode failed: {}", e))?;
    let (width, height) = img.dimensions();
    Ok((img.to_rgba8().into_raw(), width, height))
}

/// Convert YUV (BT.601) to RGB
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuyv_grey_stays_grey() {
        // Neutral chroma (128) must produce equal RGB channels
        let data = [100u8, 128, 200, 128];
        let rgba = yuyv_to_rgba(&data, 2, 1, 4);
        assert_eq!(rgba, vec![100, 100, 100, 255, 200, 200, 200, 255]);
    }

    #[test]
    fn test_yuyv_pads_truncated_frame() {
        let data = [16u8, 128, 16, 128];
        let rgba = yuyv_to_rgba(&data, 2, 2, 4);
        assert_eq!(rgba.len(), 2 * 2 * 4);
        assert_eq!(&rgba[8..], &[0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_mjpeg_rejects_garbage() {
        assert!(mjpeg_to_rgba(&[0, 1, 2, 3]).is_err());
    }
}
