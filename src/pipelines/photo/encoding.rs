// SPDX-License-Identifier: GPL-3.0-only

//! Async photo encoding
//!
//! Captures are stored losslessly as PNG wrapped in a `data:` URL so every
//! document carries its own image.

use crate::constants::storage::IMAGE_MIME;
use crate::errors::PhotoError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::{debug, info};

/// Encoded image data ready for storage
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    /// `data:image/png;base64,...` representation
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", IMAGE_MIME, BASE64.encode(&self.data))
    }
}

/// Photo encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct PhotoEncoder;

impl PhotoEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encode a bitmap as PNG on the blocking pool
    pub async fn encode(&self, image: RgbaImage) -> Result<EncodedImage, PhotoError> {
        info!(
            width = image.width(),
            height = image.height(),
            "Starting encoding"
        );

        tokio::task::spawn_blocking(move || Self::encode_png(&image))
            .await
            .map_err(|e| PhotoError::EncodingFailed(format!("Encoding task error: {}", e)))?
    }

    /// Encode image as PNG
    pub fn encode_png(image: &RgbaImage) -> Result<EncodedImage, PhotoError> {
        let mut buffer = Vec::new();
        image.write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)?;

        debug!(size = buffer.len(), "Encoding complete");

        Ok(EncodedImage {
            data: buffer,
            width: image.width(),
            height: image.height(),
        })
    }
}

/// Split a `data:<mime>;base64,<payload>` URL into MIME type and bytes
pub fn decode_data_url(url: &str) -> Result<(String, Vec<u8>), PhotoError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| PhotoError::DecodingFailed("not a data URL".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| PhotoError::DecodingFailed("data URL has no payload".to_string()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| PhotoError::DecodingFailed("data URL is not base64".to_string()))?;

    let bytes = BASE64
        .decode(payload)
        .map_err(|e| PhotoError::DecodingFailed(e.to_string()))?;

    Ok((mime.to_string(), bytes))
}

/// Decode the image embedded in a data URL
pub fn decode_image(url: &str) -> Result<DynamicImage, PhotoError> {
    let (_mime, bytes) = decode_data_url(url)?;
    image::load_from_memory(&bytes).map_err(|e| PhotoError::DecodingFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_encode_produces_png_data_url() {
        let image = RgbaImage::from_pixel(4, 3, image::Rgba([1, 2, 3, 255]));
        let encoded = PhotoEncoder::new().encode(image).await.unwrap();
        assert_eq!((encoded.width, encoded.height), (4, 3));
        assert_eq!(&encoded.data[1..4], b"PNG");

        let url = encoded.to_data_url();
        assert!(url.starts_with("data:image/png;base64,"));

        let decoded = decode_image(&url).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(3, 2).0, [1, 2, 3, 255]);
    }

    #[test]
    fn test_decode_data_url_rejects_malformed_input() {
        assert!(decode_data_url("image/png;base64,AAAA").is_err());
        assert!(decode_data_url("data:image/png;base64").is_err());
        assert!(decode_data_url("data:text/plain,hello").is_err());
        assert!(decode_data_url("data:image/png;base64,@@@").is_err());

        let (mime, bytes) = decode_data_url("data:text/plain;base64,aGk=").unwrap();
        assert_eq!(mime, "text/plain");
        assert_eq!(bytes, b"hi");
    }
}
