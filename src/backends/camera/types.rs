// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::constants::{IDEAL_HEIGHT, IDEAL_WIDTH};
use crate::errors::CameraError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Camera backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CameraBackendType {
    /// Video4Linux2 capture devices
    #[default]
    V4l2,
    /// Synthetic test-pattern source (no hardware)
    Virtual,
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::V4l2 => write!(f, "V4L2"),
            CameraBackendType::Virtual => write!(f, "virtual"),
        }
    }
}

/// Which physical camera a stream targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front-facing camera
    User,
    /// Rear-facing camera
    #[default]
    Environment,
}

impl FacingMode {
    /// The other facing mode
    pub fn toggled(self) -> Self {
        match self {
            FacingMode::User => FacingMode::Environment,
            FacingMode::Environment => FacingMode::User,
        }
    }

    /// Human-friendly name ("front" / "rear")
    pub fn label(self) -> &'static str {
        match self {
            FacingMode::User => "front",
            FacingMode::Environment => "rear",
        }
    }
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacingMode::User => write!(f, "user"),
            FacingMode::Environment => write!(f, "environment"),
        }
    }
}

impl std::str::FromStr for FacingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" | "front" => Ok(FacingMode::User),
            "environment" | "rear" | "back" => Ok(FacingMode::Environment),
            other => Err(format!("Unknown facing mode: {}", other)),
        }
    }
}

/// Stream request. All fields are preferences: a backend picks the closest
/// device and format it has instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    pub facing: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl StreamConstraints {
    pub fn new(facing: FacingMode) -> Self {
        Self {
            facing,
            ideal_width: IDEAL_WIDTH,
            ideal_height: IDEAL_HEIGHT,
        }
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.ideal_width = width;
        self.ideal_height = height;
        self
    }
}

/// A camera device reported by a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    /// Display name (V4L2 card name)
    pub name: String,
    /// Device path (e.g. /dev/video0)
    pub path: String,
    /// Driver name, when known
    pub driver: Option<String>,
}

/// A single RGBA frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Packed RGBA pixels
    pub data: Arc<[u8]>,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// Timestamp when frame was captured
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a tightly packed RGBA frame
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            stride: width * 4,
            captured_at: Instant::now(),
        }
    }

    /// RGB value at (x, y), clamped to the frame bounds
    pub fn pixel_rgb(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if self.width == 0 || self.height == 0 {
            return (0, 0, 0);
        }
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let idx = (y * self.stride + x * 4) as usize;
        if idx + 2 < self.data.len() {
            (self.data[idx], self.data[idx + 1], self.data[idx + 2])
        } else {
            (0, 0, 0)
        }
    }

    /// Copy the pixels into a tightly packed RGBA buffer (drops row padding)
    pub fn to_packed_rgba(&self) -> Vec<u8> {
        let row_len = (self.width * 4) as usize;
        if self.stride as usize == row_len {
            return self.data.to_vec();
        }
        let mut packed = Vec::with_capacity(row_len * self.height as usize);
        for row in self.data.chunks(self.stride as usize).take(self.height as usize) {
            packed.extend_from_slice(&row[..row_len.min(row.len())]);
        }
        packed
    }
}

/// Backend errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Access to the device node was refused
    PermissionDenied(String),
    /// No device could be found
    DeviceNotFound(String),
    /// Device exists but no usable format could be negotiated
    FormatNotSupported(String),
    /// Device is held by another process
    DeviceBusy(String),
    /// Other error
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            BackendError::DeviceBusy(msg) => write!(f, "Device busy: {}", msg),
            BackendError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl BackendError {
    /// Classify an I/O error from opening or configuring a device node
    pub fn from_io(path: &str, err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                BackendError::PermissionDenied(format!("{}: {}", path, err))
            }
            std::io::ErrorKind::NotFound => BackendError::DeviceNotFound(path.to_string()),
            _ if err.raw_os_error() == Some(16) => {
                // EBUSY
                BackendError::DeviceBusy(path.to_string())
            }
            _ => BackendError::Other(format!("{}: {}", path, err)),
        }
    }
}

impl From<BackendError> for CameraError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::PermissionDenied(_) => CameraError::PermissionDenied,
            BackendError::DeviceNotFound(msg) => CameraError::DeviceUnavailable(msg),
            BackendError::DeviceBusy(msg) => CameraError::DeviceUnavailable(msg),
            BackendError::FormatNotSupported(msg) => CameraError::ConstraintsUnsatisfiable(msg),
            BackendError::Other(msg) => CameraError::DeviceUnavailable(msg),
        }
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_mode_toggle_and_parse() {
        assert_eq!(FacingMode::User.toggled(), FacingMode::Environment);
        assert_eq!(FacingMode::Environment.toggled(), FacingMode::User);
        assert_eq!("front".parse::<FacingMode>(), Ok(FacingMode::User));
        assert_eq!("environment".parse::<FacingMode>(), Ok(FacingMode::Environment));
        assert!("sideways".parse::<FacingMode>().is_err());
    }

    #[test]
    fn test_packed_rgba_drops_padding() {
        // 2x2 frame with 4 bytes of padding per row
        let mut data = Vec::new();
        for row in 0..2u8 {
            data.extend_from_slice(&[row, 0, 0, 255, row, 1, 1, 255]);
            data.extend_from_slice(&[9, 9, 9, 9]);
        }
        let frame = CameraFrame {
            width: 2,
            height: 2,
            data: Arc::from(data.into_boxed_slice()),
            stride: 12,
            captured_at: Instant::now(),
        };
        let packed = frame.to_packed_rgba();
        assert_eq!(packed.len(), 16);
        assert_eq!(frame.pixel_rgb(1, 1), (1, 1, 1));
    }

    #[test]
    fn test_backend_error_maps_to_camera_error() {
        let denied = BackendError::PermissionDenied("/dev/video0".into());
        assert_eq!(CameraError::from(denied), CameraError::PermissionDenied);

        let format = BackendError::FormatNotSupported("no YUYV or MJPG".into());
        assert!(matches!(
            CameraError::from(format),
            CameraError::ConstraintsUnsatisfiable(_)
        ));
    }
}
