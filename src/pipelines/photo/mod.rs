// SPDX-License-Identifier: MPL-2.0

//! Async photo capture pipeline
//!
//! ```text
//! MediaStream → Capture (rasterize one frame) → Encoding (PNG, blocking pool) → PhotoRecord
//! ```
//!
//! The pipeline stops at building the record; persisting it and closing
//! the camera are the application's job.

pub mod capture;
pub mod encoding;

pub use capture::PhotoCapture;
pub use encoding::{EncodedImage, PhotoEncoder, decode_data_url, decode_image};

use crate::backends::camera::MediaStream;
use crate::errors::PhotoError;
use crate::storage::PhotoRecord;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

/// Source of capture timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Complete photo capture pipeline
#[derive(Clone)]
pub struct PhotoPipeline {
    encoder: PhotoEncoder,
    clock: Arc<dyn Clock>,
}

impl PhotoPipeline {
    /// Create a pipeline stamping records with the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            encoder: PhotoEncoder::new(),
            clock,
        }
    }

    /// Capture one frame from `stream` and turn it into a photo record
    ///
    /// The frame is grabbed synchronously (the stream is only borrowed for
    /// that instant); encoding then runs on the blocking pool.
    pub async fn capture(&self, stream: &dyn MediaStream) -> Result<PhotoRecord, PhotoError> {
        let bitmap = PhotoCapture::grab(stream)?;
        let captured_at = self.clock.now();

        let encoded = self.encoder.encode(bitmap).await?;
        let record = PhotoRecord::new(captured_at, encoded.to_data_url());

        info!(
            id = %record.id,
            width = encoded.width,
            height = encoded.height,
            chars = record.image_data.len(),
            "Photo captured"
        );

        Ok(record)
    }
}

impl Default for PhotoPipeline {
    fn default() -> Self {
        Self::new()
    }
}
