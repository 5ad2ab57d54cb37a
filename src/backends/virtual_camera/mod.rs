// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera backend
//!
//! Produces frames without hardware: a colour-bar test pattern, or a still
//! image loaded from disk (see [`file_source`]). Used by `--backend virtual`
//! and by the test suite, which can also make it misbehave (refuse
//! permission, have no devices, hide its frame size) and inspect how many
//! streams were opened and stopped.

pub mod file_source;

use crate::backends::camera::types::*;
use crate::backends::camera::{CameraBackend, MediaStream};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

/// Behaviour switches for the virtual camera
#[derive(Debug, Clone)]
pub struct VirtualCameraOptions {
    /// Number of simulated devices (0, 1 = front only, 2 = front + rear)
    pub devices: usize,
    /// Fail every open with a permission error
    pub deny_permission: bool,
    /// Whether streams report their frame size
    pub report_dimensions: bool,
    /// Whether streams deliver frames at all
    pub produce_frames: bool,
    /// Frame size; `None` uses the requested ideal size
    pub native_size: Option<(u32, u32)>,
    /// Serve this image instead of the test pattern
    pub source_image: Option<PathBuf>,
}

impl Default for VirtualCameraOptions {
    fn default() -> Self {
        Self {
            devices: 2,
            deny_permission: false,
            report_dimensions: true,
            produce_frames: true,
            native_size: None,
            source_image: None,
        }
    }
}

/// Open/stop bookkeeping shared by a backend and its streams
#[derive(Debug, Default)]
pub struct VirtualCameraStats {
    opened: AtomicUsize,
    stop_calls: AtomicUsize,
    last_facing: Mutex<Option<FacingMode>>,
}

impl VirtualCameraStats {
    /// Streams handed out so far
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Calls to [`MediaStream::stop`] so far (double stops are counted twice)
    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    /// Streams currently running
    pub fn active(&self) -> usize {
        self.opened().saturating_sub(self.stop_calls())
    }

    /// Facing mode of the most recent open request
    pub fn last_facing(&self) -> Option<FacingMode> {
        self.last_facing.lock().ok().and_then(|guard| *guard)
    }
}

/// Virtual camera backend
#[derive(Debug, Clone, Default)]
pub struct VirtualCameraBackend {
    options: VirtualCameraOptions,
    stats: Arc<VirtualCameraStats>,
}

impl VirtualCameraBackend {
    pub fn new() -> Self {
        Self::with_options(VirtualCameraOptions::default())
    }

    pub fn with_options(options: VirtualCameraOptions) -> Self {
        Self {
            options,
            stats: Arc::new(VirtualCameraStats::default()),
        }
    }

    /// Shared statistics handle
    pub fn stats(&self) -> Arc<VirtualCameraStats> {
        Arc::clone(&self.stats)
    }

    fn device_for(facing: FacingMode) -> CameraDevice {
        CameraDevice {
            name: format!("Virtual {} camera", facing.label()),
            path: format!("virtual://{}", facing),
            driver: Some("virtual".to_string()),
        }
    }
}

impl CameraBackend for VirtualCameraBackend {
    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Virtual
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        [FacingMode::User, FacingMode::Environment]
            .into_iter()
            .take(self.options.devices)
            .map(Self::device_for)
            .collect()
    }

    fn open(&self, constraints: &StreamConstraints) -> BackendResult<Box<dyn MediaStream>> {
        if let Ok(mut guard) = self.stats.last_facing.lock() {
            *guard = Some(constraints.facing);
        }

        if self.options.deny_permission {
            return Err(BackendError::PermissionDenied(
                "virtual camera configured to refuse access".to_string(),
            ));
        }

        // "ideal" facing: fall back to whichever device exists
        let cameras = self.enumerate_cameras();
        let device = cameras
            .iter()
            .find(|d| d.path == Self::device_for(constraints.facing).path)
            .or_else(|| cameras.first())
            .cloned()
            .ok_or_else(|| BackendError::DeviceNotFound("No virtual cameras".to_string()))?;

        let frame = if let Some(path) = &self.options.source_image {
            file_source::load_image_as_frame(path)?
        } else {
            let (width, height) = self
                .options
                .native_size
                .unwrap_or((constraints.ideal_width, constraints.ideal_height));
            test_pattern(width, height, constraints.facing)
        };

        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        info!(device = %device.name, width = frame.width, height = frame.height, "Virtual stream opened");

        Ok(Box::new(VirtualStream {
            device,
            frame,
            report_dimensions: self.options.report_dimensions,
            produce_frames: self.options.produce_frames,
            stats: Arc::clone(&self.stats),
        }))
    }
}

/// Stream over a fixed frame
struct VirtualStream {
    device: CameraDevice,
    frame: CameraFrame,
    report_dimensions: bool,
    produce_frames: bool,
    stats: Arc<VirtualCameraStats>,
}

impl MediaStream for VirtualStream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn latest_frame(&self) -> Option<CameraFrame> {
        self.produce_frames.then(|| self.frame.clone())
    }

    fn video_dimensions(&self) -> Option<(u32, u32)> {
        self.report_dimensions
            .then_some((self.frame.width, self.frame.height))
    }

    fn stop(&mut self) {
        self.stats.stop_calls.fetch_add(1, Ordering::SeqCst);
        debug!(device = %self.device.name, "Virtual stream stopped");
    }
}

/// Eight vertical colour bars; the front camera shows them mirrored
pub fn test_pattern(width: u32, height: u32, facing: FacingMode) -> CameraFrame {
    const BARS: [[u8; 3]; 8] = [
        [255, 255, 255],
        [255, 255, 0],
        [0, 255, 255],
        [0, 255, 0],
        [255, 0, 255],
        [255, 0, 0],
        [0, 0, 255],
        [0, 0, 0],
    ];

    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for _y in 0..height {
        for x in 0..width {
            let mut bar = (x as usize * BARS.len()) / width.max(1) as usize;
            if facing == FacingMode::User {
                bar = BARS.len() - 1 - bar;
            }
            let [r, g, b] = BARS[bar.min(BARS.len() - 1)];
            data.extend_from_slice(&[r, g, b, 255]);
        }
    }

    CameraFrame::from_rgba(width, height, data)
}
