// SPDX-License-Identifier: MPL-2.0

//! Error types for the photo booth
//!
//! Every user-facing action converts these into a notification at its own
//! boundary, so none of them is fatal to the process.

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Camera acquisition or session errors
    Camera(CameraError),
    /// Capture, encoding or image export errors
    Photo(PhotoError),
    /// Photo store errors
    Store(StoreError),
    /// Configuration errors
    Config(String),
    /// Generic error with message
    Other(String),
}

/// Camera-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// The user or the OS refused access to the device
    PermissionDenied,
    /// No usable camera device
    DeviceUnavailable(String),
    /// The device exists but cannot produce a stream with the requested constraints
    ConstraintsUnsatisfiable(String),
    /// An operation needed an open camera session
    NoActiveSession,
    /// A capture is already running for this session
    CaptureInProgress,
}

/// Photo capture errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoError {
    /// The stream has not delivered a frame yet
    NoFrameAvailable,
    /// PNG encoding failed
    EncodingFailed(String),
    /// Stored image data could not be decoded
    DecodingFailed(String),
    /// Handing the image to the system viewer failed
    OpenFailed(String),
}

/// Photo store errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A document with this id already exists
    Conflict(String),
    /// Read, write or delete failure in the backing database
    Storage(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Photo(e) => write!(f, "Photo error: {}", e),
            AppError::Store(e) => write!(f, "Store error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::PermissionDenied => write!(f, "Permission to use the camera was denied"),
            CameraError::DeviceUnavailable(msg) => write!(f, "Camera unavailable: {}", msg),
            CameraError::ConstraintsUnsatisfiable(msg) => {
                write!(f, "Camera cannot satisfy constraints: {}", msg)
            }
            CameraError::NoActiveSession => write!(f, "No active camera session"),
            CameraError::CaptureInProgress => write!(f, "Capture already in progress"),
        }
    }
}

impl fmt::Display for PhotoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoError::NoFrameAvailable => write!(f, "No frame available for capture"),
            PhotoError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            PhotoError::DecodingFailed(msg) => write!(f, "Decoding failed: {}", msg),
            PhotoError::OpenFailed(msg) => write!(f, "Open failed: {}", msg),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Conflict(id) => write!(f, "Document {} already exists", id),
            StoreError::Storage(msg) => write!(f, "Storage failure: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for PhotoError {}
impl std::error::Error for StoreError {}

// Conversions from sub-errors to AppError
impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<PhotoError> for AppError {
    fn from(err: PhotoError) -> Self {
        AppError::Photo(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Storage(format!("Malformed document: {}", err))
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::Storage(format!("Store task error: {}", err))
    }
}

impl From<image::ImageError> for PhotoError {
    fn from(err: image::ImageError) -> Self {
        PhotoError::EncodingFailed(err.to_string())
    }
}

impl From<std::io::Error> for PhotoError {
    fn from(err: std::io::Error) -> Self {
        PhotoError::OpenFailed(err.to_string())
    }
}
