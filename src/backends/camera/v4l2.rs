// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera backend
//!
//! Desktop webcams do not report which way they face, so facing mode is
//! resolved from configuration first and device order second: the first
//! capture device is treated as the front ("user") camera and the second as
//! the rear ("environment") one. Like a browser's `ideal` constraint, a
//! request that cannot be matched falls back to the first device.

use super::format_converters;
use super::types::*;
use super::{CameraBackend, MediaStream};
use crate::constants::v4l2 as v4l2_consts;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

/// Consecutive dequeue failures tolerated before the capture thread gives up
const MAX_CONSECUTIVE_ERRORS: u32 = 30;

/// V4L2 backend
#[derive(Debug, Clone, Default)]
pub struct V4l2Backend {
    /// Device path forced for the front camera
    user_device: Option<String>,
    /// Device path forced for the rear camera
    environment_device: Option<String>,
}

impl V4l2Backend {
    pub fn new(user_device: Option<String>, environment_device: Option<String>) -> Self {
        Self {
            user_device,
            environment_device,
        }
    }

    fn configured_path(&self, facing: FacingMode) -> Option<&str> {
        match facing {
            FacingMode::User => self.user_device.as_deref(),
            FacingMode::Environment => self.environment_device.as_deref(),
        }
    }
}

impl CameraBackend for V4l2Backend {
    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::V4l2
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        enumerate_v4l2_cameras()
    }

    fn open(&self, constraints: &StreamConstraints) -> BackendResult<Box<dyn MediaStream>> {
        let cameras = self.enumerate_cameras();
        let device = select_device(
            &cameras,
            constraints.facing,
            self.configured_path(constraints.facing),
        )
        .cloned()
        .ok_or_else(|| BackendError::DeviceNotFound("No V4L2 capture devices".to_string()))?;

        info!(
            device = %device.name,
            path = %device.path,
            facing = %constraints.facing,
            "Opening V4L2 stream"
        );

        let stream = V4l2Stream::start(device, constraints.ideal_width, constraints.ideal_height)?;
        Ok(Box::new(stream))
    }
}

/// Pick the device for a facing mode
///
/// A configured path wins when it is present; otherwise index 0 serves
/// `user` and index 1 serves `environment`, falling back to index 0.
pub fn select_device<'a>(
    cameras: &'a [CameraDevice],
    facing: FacingMode,
    configured_path: Option<&str>,
) -> Option<&'a CameraDevice> {
    if let Some(path) = configured_path {
        if let Some(device) = cameras.iter().find(|c| c.path == path) {
            return Some(device);
        }
        warn!(path, facing = %facing, "Configured camera not present, using device order");
    }

    match facing {
        FacingMode::User => cameras.first(),
        FacingMode::Environment => cameras.get(1).or_else(|| cameras.first()),
    }
}

/// Scan /dev/video* for devices that can capture YUYV or MJPG frames
pub fn enumerate_v4l2_cameras() -> Vec<CameraDevice> {
    let mut nodes: Vec<(u32, String)> = std::fs::read_dir("/dev")
        .into_iter()
        .flatten()
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            let index = name.strip_prefix("video")?.parse::<u32>().ok()?;
            Some((index, entry.path().to_string_lossy().to_string()))
        })
        .collect();
    nodes.sort_by_key(|(index, _)| *index);

    let mut cameras = Vec::new();
    for (_, path) in nodes {
        let Ok(dev) = Device::with_path(&path) else {
            continue;
        };
        let Ok(caps) = dev.query_caps() else {
            continue;
        };
        if !caps
            .capabilities
            .contains(v4l::capability::Flags::VIDEO_CAPTURE)
        {
            continue;
        }

        // Metadata nodes of UVC cameras advertise capture but list no formats
        let formats = dev.enum_formats().unwrap_or_default();
        let usable = formats
            .iter()
            .any(|f| f.fourcc == FourCC::new(b"YUYV") || f.fourcc == FourCC::new(b"MJPG"));
        if !usable {
            debug!(path = %path, "Skipping V4L2 node without YUYV/MJPG formats");
            continue;
        }

        debug!(path = %path, card = %caps.card, driver = %caps.driver, "Found V4L2 camera");
        cameras.push(CameraDevice {
            name: caps.card,
            path,
            driver: Some(caps.driver),
        });
    }

    cameras
}

/// Negotiate a capture format, preferring YUYV and falling back to MJPG
fn negotiate_format(dev: &Device, path: &str, width: u32, height: u32) -> BackendResult<Format> {
    for fourcc in [FourCC::new(b"YUYV"), FourCC::new(b"MJPG")] {
        match dev.set_format(&Format::new(width, height, fourcc)) {
            Ok(actual) if actual.fourcc == fourcc => return Ok(actual),
            Ok(actual) => {
                debug!(requested = ?fourcc, got = ?actual.fourcc, "Driver substituted format");
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(BackendError::from_io(path, &e));
            }
            Err(e) => {
                debug!(fourcc = ?fourcc, error = %e, "Format rejected");
            }
        }
    }

    Err(BackendError::FormatNotSupported(format!(
        "{} offers neither YUYV nor MJPG near {}x{}",
        path, width, height
    )))
}

/// A running V4L2 stream backed by a capture thread
pub struct V4l2Stream {
    device: CameraDevice,
    dimensions: (u32, u32),
    latest: Arc<Mutex<Option<CameraFrame>>>,
    stop_signal: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl V4l2Stream {
    fn start(device: CameraDevice, width: u32, height: u32) -> BackendResult<Self> {
        let latest = Arc::new(Mutex::new(None));
        let stop_signal = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = std_mpsc::channel();

        let thread = {
            let path = device.path.clone();
            let latest = Arc::clone(&latest);
            let stop_signal = Arc::clone(&stop_signal);
            std::thread::Builder::new()
                .name("v4l2-capture".to_string())
                .spawn(move || capture_loop(path, width, height, ready_tx, latest, stop_signal))
                .map_err(|e| BackendError::Other(format!("Failed to spawn capture thread: {}", e)))?
        };

        match ready_rx.recv_timeout(Duration::from_millis(v4l2_consts::OPEN_TIMEOUT_MS)) {
            Ok(Ok(dimensions)) => Ok(Self {
                device,
                dimensions,
                latest,
                stop_signal,
                thread: Some(thread),
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                // The thread is stuck in the driver; tell it to exit whenever it returns
                stop_signal.store(true, Ordering::SeqCst);
                Err(BackendError::DeviceBusy(format!(
                    "{} did not start streaming",
                    device.path
                )))
            }
        }
    }
}

impl MediaStream for V4l2Stream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn latest_frame(&self) -> Option<CameraFrame> {
        self.latest.lock().ok().and_then(|guard| guard.clone())
    }

    fn video_dimensions(&self) -> Option<(u32, u32)> {
        Some(self.dimensions)
    }

    fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!(path = %self.device.path, "V4L2 capture thread panicked");
            }
            info!(path = %self.device.path, "V4L2 stream stopped");
        }
    }
}

impl Drop for V4l2Stream {
    fn drop(&mut self) {
        self.stop();
    }
}

fn capture_loop(
    path: String,
    width: u32,
    height: u32,
    ready: std_mpsc::Sender<BackendResult<(u32, u32)>>,
    latest: Arc<Mutex<Option<CameraFrame>>>,
    stop_signal: Arc<AtomicBool>,
) {
    let dev = match Device::with_path(&path) {
        Ok(dev) => dev,
        Err(e) => {
            let _ = ready.send(Err(BackendError::from_io(&path, &e)));
            return;
        }
    };

    let format = match negotiate_format(&dev, &path, width, height) {
        Ok(format) => format,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    info!(
        width = format.width,
        height = format.height,
        fourcc = ?format.fourcc,
        "V4L2 format configured"
    );

    let mut stream = match Stream::with_buffers(&dev, Type::VideoCapture, v4l2_consts::BUFFER_COUNT)
    {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(BackendError::from_io(&path, &e)));
            return;
        }
    };

    if ready.send(Ok((format.width, format.height))).is_err() {
        // open() already gave up on us
        return;
    }

    let is_mjpeg = format.fourcc == FourCC::new(b"MJPG");
    let mut consecutive_errors = 0;

    while !stop_signal.load(Ordering::SeqCst) {
        let (buf, meta) = match stream.next() {
            Ok(frame) => frame,
            Err(e) => {
                consecutive_errors += 1;
                warn!(error = %e, "Failed to dequeue frame");
                if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                    error!(path = %path, "Too many capture errors, stopping stream");
                    break;
                }
                continue;
            }
        };
        consecutive_errors = 0;

        let used = match meta.bytesused as usize {
            0 => buf.len(),
            n => n.min(buf.len()),
        };
        let data = &buf[..used];

        let frame = if is_mjpeg {
            match format_converters::mjpeg_to_rgba(data) {
                Ok((rgba, w, h)) => CameraFrame::from_rgba(w, h, rgba),
                Err(e) => {
                    debug!(error = %e, "Dropping corrupt MJPEG frame");
                    continue;
                }
            }
        } else {
            let rgba =
                format_converters::yuyv_to_rgba(data, format.width, format.height, format.stride);
            CameraFrame::from_rgba(format.width, format.height, rgba)
        };

        if let Ok(mut guard) = latest.lock() {
            *guard = Some(frame);
        }
    }

    debug!(path = %path, "V4L2 capture loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(path: &str) -> CameraDevice {
        CameraDevice {
            name: path.to_string(),
            path: path.to_string(),
            driver: None,
        }
    }

    #[test]
    fn test_select_device_by_order() {
        let cameras = vec![device("/dev/video0"), device("/dev/video2")];
        assert_eq!(
            select_device(&cameras, FacingMode::User, None).map(|d| d.path.as_str()),
            Some("/dev/video0")
        );
        assert_eq!(
            select_device(&cameras, FacingMode::Environment, None).map(|d| d.path.as_str()),
            Some("/dev/video2")
        );
    }

    #[test]
    fn test_select_device_falls_back_to_first() {
        let cameras = vec![device("/dev/video0")];
        assert_eq!(
            select_device(&cameras, FacingMode::Environment, None).map(|d| d.path.as_str()),
            Some("/dev/video0")
        );
        assert!(select_device(&[], FacingMode::User, None).is_none());
    }

    #[test]
    fn test_select_device_prefers_configured_path() {
        let cameras = vec![device("/dev/video0"), device("/dev/video2")];
        let selected = select_device(&cameras, FacingMode::User, Some("/dev/video2"));
        assert_eq!(selected.map(|d| d.path.as_str()), Some("/dev/video2"));

        // Missing configured device falls back to order
        let selected = select_device(&cameras, FacingMode::User, Some("/dev/video9"));
        assert_eq!(selected.map(|d| d.path.as_str()), Some("/dev/video0"));
    }
}
