// SPDX-License-Identifier: GPL-3.0-only

//! Camera controller
//!
//! Owns the single active stream (wrapped in a [`CameraSession`]) and the
//! facing-mode preference, and keeps the UI affordances in sync with them.

use crate::backends::camera::{
    CameraBackend, CameraDevice, CameraFrame, FacingMode, MediaStream, StreamConstraints,
};
use crate::constants::messages;
use crate::errors::CameraError;
use std::sync::Arc;
use tracing::{error, info, warn};

/// An open camera stream
///
/// The stream is stopped exactly once: by [`CameraSession::stop`] or, if
/// that never happens, when the session is dropped.
pub struct CameraSession {
    stream: Box<dyn MediaStream>,
    facing: FacingMode,
    stopped: bool,
}

impl CameraSession {
    pub fn new(stream: Box<dyn MediaStream>, facing: FacingMode) -> Self {
        Self {
            stream,
            facing,
            stopped: false,
        }
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    pub fn device(&self) -> &CameraDevice {
        self.stream.device()
    }

    pub fn stream(&self) -> &dyn MediaStream {
        self.stream.as_ref()
    }

    /// Stop every track and release the device
    pub fn stop(mut self) {
        self.stop_tracks();
    }

    fn stop_tracks(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.stream.stop();
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        if !self.stopped {
            warn!(device = %self.stream.device().name, "Camera session dropped while open");
            self.stop_tracks();
        }
    }
}

/// State of the camera affordances shown by the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraControls {
    /// Label of the open-camera button
    pub open_label: &'static str,
    /// Whether the open-camera button accepts presses
    pub open_enabled: bool,
    /// Whether the preview surface is bound to a stream
    pub preview_visible: bool,
    /// Facing mode the next open will request
    pub facing: FacingMode,
}

/// Result of [`CameraController::toggle_facing`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// No session was open; only the preference changed
    PreferenceChanged(FacingMode),
    /// The session was reopened with the new facing mode
    Reopened(Result<(), CameraError>),
}

/// Camera controller
pub struct CameraController {
    backend: Arc<dyn CameraBackend>,
    session: Option<CameraSession>,
    facing: FacingMode,
    ideal_size: (u32, u32),
}

impl CameraController {
    pub fn new(backend: Arc<dyn CameraBackend>, facing: FacingMode) -> Self {
        Self {
            backend,
            session: None,
            facing,
            ideal_size: (crate::constants::IDEAL_WIDTH, crate::constants::IDEAL_HEIGHT),
        }
    }

    /// Override the requested stream resolution
    pub fn with_ideal_size(mut self, width: u32, height: u32) -> Self {
        self.ideal_size = (width, height);
        self
    }

    pub fn backend(&self) -> &Arc<dyn CameraBackend> {
        &self.backend
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    pub fn session(&self) -> Option<&CameraSession> {
        self.session.as_ref()
    }

    /// Latest frame for the preview surface
    pub fn preview_frame(&self) -> Option<CameraFrame> {
        self.session.as_ref()?.stream().latest_frame()
    }

    pub fn controls(&self) -> CameraControls {
        let open = self.is_open();
        CameraControls {
            open_label: if open {
                messages::OPEN_LABEL_ACTIVE
            } else {
                messages::OPEN_LABEL
            },
            open_enabled: !open,
            preview_visible: open,
            facing: self.facing,
        }
    }

    /// Open a stream with the current facing preference
    ///
    /// Device negotiation blocks, so it runs on the blocking pool. Calling
    /// this while a session is open is a no-op returning `Ok`.
    pub async fn open(&mut self) -> Result<(), CameraError> {
        if self.session.is_some() {
            return Ok(());
        }

        let constraints = StreamConstraints::new(self.facing)
            .with_resolution(self.ideal_size.0, self.ideal_size.1);
        let backend = Arc::clone(&self.backend);

        let stream = tokio::task::spawn_blocking(move || backend.open(&constraints))
            .await
            .map_err(|e| CameraError::DeviceUnavailable(format!("Camera task error: {}", e)))?
            .map_err(|e| {
                error!(error = %e, facing = %self.facing, "Failed to open camera");
                CameraError::from(e)
            })?;

        info!(device = %stream.device().name, facing = %self.facing, "Camera opened");
        self.session = Some(CameraSession::new(stream, self.facing));
        Ok(())
    }

    /// Flip the facing preference, reopening the camera if it was open
    ///
    /// If the reopen fails the controller is left closed.
    pub async fn toggle_facing(&mut self) -> ToggleOutcome {
        self.facing = self.facing.toggled();
        info!(facing = %self.facing, "Facing mode toggled");

        if self.session.is_some() {
            self.close();
            ToggleOutcome::Reopened(self.open().await)
        } else {
            ToggleOutcome::PreferenceChanged(self.facing)
        }
    }

    /// Stop the active session; silent no-op when closed
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            let device = session.device().name.clone();
            session.stop();
            info!(device = %device, "Camera closed");
        }
    }
}

impl Drop for CameraController {
    fn drop(&mut self) {
        self.close();
    }
}
