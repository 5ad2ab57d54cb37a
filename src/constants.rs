// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Application identifier used for data, cache and config directories
pub const APP_ID: &str = "photobooth";

/// Requested stream resolution (treated as "ideal", not "exact")
pub const IDEAL_WIDTH: u32 = 640;
pub const IDEAL_HEIGHT: u32 = 480;

/// Capture size used when the stream cannot report its frame dimensions
pub const FALLBACK_CAPTURE_SIZE: (u32, u32) = (640, 480);

/// Notification banner timing
pub mod timing {
    /// How long a notification stays fully visible
    pub const NOTIFICATION_VISIBLE_MS: u64 = 1600;
    /// Length of the fade-out phase before the banner hides
    pub const NOTIFICATION_FADE_MS: u64 = 250;
    /// Number of past notifications kept for inspection
    pub const NOTIFICATION_HISTORY: usize = 32;
    /// Terminal redraw interval
    pub const UI_TICK_MS: u64 = 33;
}

/// Photo store layout
pub mod storage {
    /// Database name, also the file stem of the SQLite file
    pub const DATABASE_NAME: &str = "pwa_photos_v1";
    /// Bumped whenever the table layout changes
    pub const SCHEMA_VERSION: i32 = 1;
    /// MIME type of stored images
    pub const IMAGE_MIME: &str = "image/png";
}

/// V4L2 capture parameters
pub mod v4l2 {
    /// Number of mmap buffers requested from the driver
    pub const BUFFER_COUNT: u32 = 4;
    /// How long `open` waits for the capture thread to negotiate a format
    pub const OPEN_TIMEOUT_MS: u64 = 3000;
}

/// Banner colours per severity (CSS hex notation)
pub mod colors {
    pub const SUCCESS: &str = "#28a745";
    pub const ERROR: &str = "#dc3545";
    pub const INFO: &str = "#317efb";
    pub const MUTED: &str = "#6c757d";
}

/// User-facing notification texts
pub mod messages {
    pub const CAMERA_OPENED: &str = "Camera opened";
    pub const CAMERA_ALREADY_OPEN: &str = "Camera is already open";
    pub const CAMERA_OPEN_FAILED: &str = "Could not access the camera";
    pub const FRONT_SELECTED: &str = "Front camera selected";
    pub const REAR_SELECTED: &str = "Rear camera selected";
    pub const OPEN_CAMERA_FIRST: &str = "Open the camera first";
    pub const CAPTURE_IN_PROGRESS: &str = "Capture already in progress";
    pub const PHOTO_SAVED: &str = "Photo saved";
    pub const PHOTO_SAVE_FAILED: &str = "Could not save photo";
    pub const NOTHING_TO_CLEAR: &str = "Nothing to clear";
    pub const GALLERY_CLEARED: &str = "Gallery cleared";
    pub const GALLERY_CLEAR_FAILED: &str = "Could not clear gallery";
    pub const GALLERY_LOAD_FAILED: &str = "Could not load gallery";
    pub const NO_PHOTO_SELECTED: &str = "No photo selected";
    pub const PHOTO_OPENED: &str = "Photo opened";
    pub const PHOTO_OPEN_FAILED: &str = "Could not open photo";

    /// Label of the open-camera affordance
    pub const OPEN_LABEL: &str = "Open camera";
    pub const OPEN_LABEL_ACTIVE: &str = "Camera open";
}

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}
