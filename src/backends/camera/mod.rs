// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │  CameraController   │  ← Session lifecycle, facing mode, UI affordances
//! └──────────┬──────────┘
//!            │ open(constraints)
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackend Trait │  ← Device selection, format negotiation
//! └──────────┬──────────┘
//!            │
//!       ┌────┴─────┐
//!       ▼          ▼
//!    ┌──────┐  ┌───────┐
//!    │ V4L2 │  │Virtual│
//!    └──────┘  └───────┘
//! ```
//!
//! A backend hands out [`MediaStream`]s. The stream owns the hardware until
//! [`MediaStream::stop`] is called; the controller makes sure that happens
//! exactly once per stream.

pub mod format_converters;
pub mod types;
pub mod v4l2;

pub use types::*;

use crate::backends::virtual_camera::VirtualCameraBackend;
use crate::config::Config;
use std::sync::Arc;

/// Camera backend trait
///
/// Implementations must be cheap to share; opening a stream may block
/// (device negotiation), so callers run [`CameraBackend::open`] on a
/// blocking worker.
pub trait CameraBackend: Send + Sync {
    /// Get the backend type identifier
    fn backend_type(&self) -> CameraBackendType;

    /// Enumerate available cameras on this backend
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Open a stream matching the constraints as closely as possible
    ///
    /// # Returns
    /// * `Ok(stream)` - A running stream; the caller owns it and must stop it
    /// * `Err(BackendError::PermissionDenied)` - Access refused
    /// * `Err(BackendError::DeviceNotFound)` - No camera present
    /// * `Err(BackendError::FormatNotSupported)` - No usable format
    fn open(&self, constraints: &StreamConstraints) -> BackendResult<Box<dyn MediaStream>>;
}

/// A running video stream
pub trait MediaStream: Send + Sync {
    /// Device the stream was opened on
    fn device(&self) -> &CameraDevice;

    /// Most recent frame, if the stream has produced one
    fn latest_frame(&self) -> Option<CameraFrame>;

    /// Current frame dimensions, if known
    fn video_dimensions(&self) -> Option<(u32, u32)>;

    /// Stop every track of the stream and release the device
    fn stop(&mut self);
}

/// Create the backend selected in the configuration
pub fn get_backend(config: &Config) -> Arc<dyn CameraBackend> {
    match config.backend {
        CameraBackendType::V4l2 => Arc::new(v4l2::V4l2Backend::new(
            config.user_device.clone(),
            config.environment_device.clone(),
        )),
        CameraBackendType::Virtual => Arc::new(VirtualCameraBackend::new()),
    }
}
