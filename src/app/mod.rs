// SPDX-License-Identifier: GPL-3.0-only

//! Application core
//!
//! [`PhotoApp`] wires the camera controller, the capture pipeline, the photo
//! store, the gallery and the notifier together. Every user action is an
//! async method that catches its own failures and reports them through a
//! [`Notification`]; nothing escapes as an error.
//!
//! The app is cheap to clone. Front ends (the terminal UI, the headless
//! commands) spawn actions as tasks and read state back through the
//! accessors.

pub mod camera_ops;
pub mod gallery;
pub mod notifications;

pub use camera_ops::{CameraController, CameraControls, CameraSession, ToggleOutcome};
pub use gallery::{GalleryView, Thumbnail};
pub use notifications::{Banner, Notification, NotificationTiming, Notifier, Phase, Severity};

use crate::backends::camera::{CameraBackend, CameraFrame, FacingMode};
use crate::config::Config;
use crate::constants::messages;
use crate::errors::CameraError;
use crate::pipelines::photo::{Clock, PhotoPipeline, SystemClock};
use crate::storage::{ClearOutcome, PhotoStore};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{error, info, warn};

/// User actions accepted by [`PhotoApp::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    OpenCamera,
    TakePhoto,
    ToggleCamera,
    ClearGallery,
    Hydrate,
    OpenThumbnail,
    SelectNext,
    SelectPrevious,
}

/// Marks a capture as in flight until dropped
struct CaptureGuard<'a>(&'a AtomicBool);

impl<'a> CaptureGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for CaptureGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct Inner {
    controller: tokio::sync::Mutex<CameraController>,
    pipeline: PhotoPipeline,
    store: PhotoStore,
    gallery: Mutex<GalleryView>,
    notifier: Notifier,
    capturing: AtomicBool,
    export_dir: PathBuf,
}

/// Builder for [`PhotoApp`]
pub struct PhotoAppBuilder {
    backend: Arc<dyn CameraBackend>,
    store: PhotoStore,
    facing: FacingMode,
    ideal_size: (u32, u32),
    timing: NotificationTiming,
    clock: Arc<dyn Clock>,
    export_dir: PathBuf,
}

impl PhotoAppBuilder {
    pub fn facing(mut self, facing: FacingMode) -> Self {
        self.facing = facing;
        self
    }

    pub fn ideal_size(mut self, width: u32, height: u32) -> Self {
        self.ideal_size = (width, height);
        self
    }

    pub fn timing(mut self, timing: NotificationTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Clock used to stamp new photos
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Directory full-size photos are written to before opening them
    pub fn export_dir(mut self, dir: PathBuf) -> Self {
        self.export_dir = dir;
        self
    }

    pub fn build(self) -> PhotoApp {
        let controller = CameraController::new(self.backend, self.facing)
            .with_ideal_size(self.ideal_size.0, self.ideal_size.1);

        PhotoApp {
            inner: Arc::new(Inner {
                controller: tokio::sync::Mutex::new(controller),
                pipeline: PhotoPipeline::with_clock(self.clock),
                store: self.store,
                gallery: Mutex::new(GalleryView::new()),
                notifier: Notifier::new(self.timing),
                capturing: AtomicBool::new(false),
                export_dir: self.export_dir,
            }),
        }
    }
}

/// The photo booth application
#[derive(Clone)]
pub struct PhotoApp {
    inner: Arc<Inner>,
}

impl PhotoApp {
    pub fn builder(backend: Arc<dyn CameraBackend>, store: PhotoStore) -> PhotoAppBuilder {
        PhotoAppBuilder {
            backend,
            store,
            facing: FacingMode::default(),
            ideal_size: (crate::constants::IDEAL_WIDTH, crate::constants::IDEAL_HEIGHT),
            timing: NotificationTiming::default(),
            clock: Arc::new(SystemClock),
            export_dir: Config::cache_dir().join("photos"),
        }
    }

    /// App configured from `config`
    pub fn from_config(config: &Config, backend: Arc<dyn CameraBackend>, store: PhotoStore) -> Self {
        Self::builder(backend, store)
            .facing(config.default_facing)
            .ideal_size(config.ideal_width, config.ideal_height)
            .timing(NotificationTiming {
                visible: Duration::from_millis(config.notification_visible_ms),
                fade: Duration::from_millis(config.notification_fade_ms),
            })
            .build()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    pub fn store(&self) -> &PhotoStore {
        &self.inner.store
    }

    /// Lock the gallery for reading or navigation
    pub fn gallery(&self) -> MutexGuard<'_, GalleryView> {
        self.inner
            .gallery
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether a capture is currently running
    pub fn is_capturing(&self) -> bool {
        self.inner.capturing.load(Ordering::Acquire)
    }

    /// Camera affordances; `None` while a camera operation holds the controller
    pub fn controls(&self) -> Option<CameraControls> {
        self.inner.controller.try_lock().ok().map(|c| c.controls())
    }

    /// Latest preview frame; `None` when closed or while the controller is busy
    pub fn preview_frame(&self) -> Option<CameraFrame> {
        self.inner.controller.try_lock().ok()?.preview_frame()
    }

    pub async fn is_camera_open(&self) -> bool {
        self.inner.controller.lock().await.is_open()
    }

    pub async fn facing(&self) -> FacingMode {
        self.inner.controller.lock().await.facing()
    }

    fn notify(&self, message: &str, severity: Severity) -> Notification {
        self.inner.notifier.notify(message, severity)
    }

    /// Dispatch a user action
    ///
    /// Returns the notification the action produced. Selection changes and a
    /// successful hydrate are silent.
    pub async fn update(&self, message: Message) -> Option<Notification> {
        match message {
            Message::OpenCamera => Some(self.open_camera().await),
            Message::TakePhoto => Some(self.take_photo().await),
            Message::ToggleCamera => Some(self.toggle_camera().await),
            Message::ClearGallery => Some(self.clear_gallery().await),
            Message::Hydrate => self.hydrate().await,
            Message::OpenThumbnail => Some(self.open_selected().await),
            Message::SelectNext => {
                self.gallery().select_next();
                None
            }
            Message::SelectPrevious => {
                self.gallery().select_previous();
                None
            }
        }
    }

    /// Open the camera with the current facing preference
    pub async fn open_camera(&self) -> Notification {
        let mut controller = self.inner.controller.lock().await;
        if controller.is_open() {
            return self.notify(messages::CAMERA_ALREADY_OPEN, Severity::Info);
        }

        match controller.open().await {
            Ok(()) => self.notify(messages::CAMERA_OPENED, Severity::Success),
            Err(e) => {
                error!(error = %e, "Camera open failed");
                self.notify(messages::CAMERA_OPEN_FAILED, Severity::Error)
            }
        }
    }

    /// Flip between front and rear camera
    pub async fn toggle_camera(&self) -> Notification {
        let mut controller = self.inner.controller.lock().await;
        match controller.toggle_facing().await {
            ToggleOutcome::PreferenceChanged(FacingMode::User) => {
                self.notify(messages::FRONT_SELECTED, Severity::Info)
            }
            ToggleOutcome::PreferenceChanged(FacingMode::Environment) => {
                self.notify(messages::REAR_SELECTED, Severity::Info)
            }
            ToggleOutcome::Reopened(Ok(())) => {
                self.notify(messages::CAMERA_OPENED, Severity::Success)
            }
            ToggleOutcome::Reopened(Err(e)) => {
                error!(error = %e, "Camera reopen failed");
                self.notify(messages::CAMERA_OPEN_FAILED, Severity::Error)
            }
        }
    }

    /// Capture one photo, store it and show it first in the gallery
    ///
    /// The camera is closed afterwards whatever the outcome, once the store
    /// write has completed.
    pub async fn take_photo(&self) -> Notification {
        let Some(_guard) = CaptureGuard::acquire(&self.inner.capturing) else {
            info!(reason = %CameraError::CaptureInProgress, "Capture request ignored");
            return self.notify(messages::CAPTURE_IN_PROGRESS, Severity::Info);
        };

        let mut controller = self.inner.controller.lock().await;
        let Some(session) = controller.session() else {
            warn!(reason = %CameraError::NoActiveSession, "Capture request rejected");
            return self.notify(messages::OPEN_CAMERA_FIRST, Severity::Error);
        };

        let notification = match self.inner.pipeline.capture(session.stream()).await {
            Ok(record) => match self.inner.store.put(record.clone()).await {
                Ok(()) => {
                    info!(id = %record.id, "Photo saved");
                    self.gallery().prepend(record);
                    self.notify(messages::PHOTO_SAVED, Severity::Success)
                }
                Err(e) => {
                    error!(id = %record.id, error = %e, "Failed to store photo");
                    self.notify(messages::PHOTO_SAVE_FAILED, Severity::Error)
                }
            },
            Err(e) => {
                error!(error = %e, "Failed to capture photo");
                self.notify(messages::PHOTO_SAVE_FAILED, Severity::Error)
            }
        };

        controller.close();
        notification
    }

    /// Delete every stored photo
    pub async fn clear_gallery(&self) -> Notification {
        match self.inner.store.clear_all().await {
            Ok(ClearOutcome::Cleared { removed }) => {
                info!(removed, "Gallery cleared");
                self.gallery().clear();
                self.notify(messages::GALLERY_CLEARED, Severity::Info)
            }
            Ok(ClearOutcome::EmptyStoreNoop) => {
                self.notify(messages::NOTHING_TO_CLEAR, Severity::Muted)
            }
            Err(e) => {
                error!(error = %e, "Failed to clear gallery");
                self.notify(messages::GALLERY_CLEAR_FAILED, Severity::Error)
            }
        }
    }

    /// Reload the gallery from the store
    pub async fn hydrate(&self) -> Option<Notification> {
        match self.inner.store.list_all().await {
            Ok(records) => {
                self.gallery().hydrate(records);
                None
            }
            Err(e) => {
                error!(error = %e, "Failed to load gallery");
                Some(self.notify(messages::GALLERY_LOAD_FAILED, Severity::Error))
            }
        }
    }

    /// Open the selected thumbnail in the system image viewer
    pub async fn open_selected(&self) -> Notification {
        let Some(thumbnail) = self.gallery().selected().cloned() else {
            return self.notify(messages::NO_PHOTO_SELECTED, Severity::Muted);
        };

        let dir = self.inner.export_dir.clone();
        let result = tokio::task::spawn_blocking(move || thumbnail.open_full(&dir)).await;

        match result {
            Ok(Ok(_path)) => self.notify(messages::PHOTO_OPENED, Severity::Info),
            Ok(Err(e)) => {
                error!(error = %e, "Failed to open photo");
                self.notify(messages::PHOTO_OPEN_FAILED, Severity::Error)
            }
            Err(e) => {
                error!(error = %e, "Photo open task failed");
                self.notify(messages::PHOTO_OPEN_FAILED, Severity::Error)
            }
        }
    }

    /// Release the camera before the process exits
    pub async fn shutdown(&self) {
        self.inner.controller.lock().await.close();
        info!("Photo booth shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_camera::{VirtualCameraBackend, VirtualCameraOptions};

    fn app_with(options: VirtualCameraOptions) -> (PhotoApp, VirtualCameraBackend) {
        let backend = VirtualCameraBackend::with_options(options);
        let store = PhotoStore::open_in_memory().unwrap();
        let app = PhotoApp::builder(Arc::new(backend.clone()), store)
            .ideal_size(32, 24)
            .build();
        (app, backend)
    }

    #[test]
    fn test_capture_guard_releases_on_drop() {
        let flag = AtomicBool::new(false);
        let guard = CaptureGuard::acquire(&flag);
        assert!(guard.is_some());
        assert!(CaptureGuard::acquire(&flag).is_none());
        drop(guard);
        assert!(CaptureGuard::acquire(&flag).is_some());
    }

    #[tokio::test]
    async fn test_open_twice_reports_already_open() {
        let (app, backend) = app_with(VirtualCameraOptions::default());

        let first = app.open_camera().await;
        assert_eq!(first.severity, Severity::Success);
        let second = app.open_camera().await;
        assert_eq!(second.message, messages::CAMERA_ALREADY_OPEN);
        assert_eq!(second.severity, Severity::Info);
        assert_eq!(backend.stats().opened(), 1);
    }

    #[tokio::test]
    async fn test_open_denied_reports_failure() {
        let (app, _backend) = app_with(VirtualCameraOptions {
            deny_permission: true,
            ..Default::default()
        });

        let notification = app.open_camera().await;
        assert!(notification.is_failure());
        assert!(!app.is_camera_open().await);
        assert!(app.controls().unwrap().open_enabled);
    }

    #[tokio::test]
    async fn test_toggle_while_closed_names_new_camera() {
        let (app, _backend) = app_with(VirtualCameraOptions::default());
        assert_eq!(app.facing().await, FacingMode::Environment);

        let notification = app.toggle_camera().await;
        assert_eq!(notification.message, messages::FRONT_SELECTED);
        assert_eq!(app.facing().await, FacingMode::User);

        let notification = app.toggle_camera().await;
        assert_eq!(notification.message, messages::REAR_SELECTED);
    }

    #[tokio::test]
    async fn test_update_dispatches_selection_silently() {
        let (app, _backend) = app_with(VirtualCameraOptions::default());
        assert_eq!(app.update(Message::SelectNext).await, None);
        assert_eq!(app.update(Message::Hydrate).await, None);

        let notification = app.update(Message::OpenThumbnail).await.unwrap();
        assert_eq!(notification.message, messages::NO_PHOTO_SELECTED);
    }

    #[tokio::test]
    async fn test_shutdown_closes_camera() {
        let (app, backend) = app_with(VirtualCameraOptions::default());
        app.open_camera().await;
        app.shutdown().await;

        assert!(!app.is_camera_open().await);
        assert_eq!(backend.stats().stop_calls(), 1);
        assert_eq!(backend.stats().active(), 0);
    }
}
