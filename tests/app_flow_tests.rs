// SPDX-License-Identifier: MPL-2.0

//! End-to-end flows through the application core

use chrono::{DateTime, TimeZone, Utc};
use photobooth::app::{PhotoApp, Severity};
use photobooth::backends::camera::FacingMode;
use photobooth::backends::virtual_camera::{VirtualCameraBackend, VirtualCameraOptions};
use photobooth::constants::messages;
use photobooth::pipelines::photo::{Clock, decode_image};
use photobooth::storage::{ClearOutcome, PhotoStore};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Clock that moves one second forward on every reading
struct StepClock {
    next_ms: AtomicI64,
}

impl StepClock {
    fn starting_at(at: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            next_ms: AtomicI64::new(at.timestamp_millis()),
        })
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let ms = self.next_ms.fetch_add(1_000, Ordering::SeqCst);
        Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
    }
}

/// Clock stuck at one instant
struct FrozenClock(DateTime<Utc>);

impl Clock for FrozenClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

struct Harness {
    app: PhotoApp,
    backend: VirtualCameraBackend,
    store: PhotoStore,
}

fn harness_with(options: VirtualCameraOptions, clock: Arc<dyn Clock>) -> Harness {
    let backend = VirtualCameraBackend::with_options(options);
    let store = PhotoStore::open_in_memory().unwrap();
    let app = PhotoApp::builder(Arc::new(backend.clone()), store.clone())
        .ideal_size(48, 36)
        .clock(clock)
        .build();
    Harness {
        app,
        backend,
        store,
    }
}

fn harness() -> Harness {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    harness_with(VirtualCameraOptions::default(), StepClock::starting_at(start))
}

#[tokio::test]
async fn test_capture_adds_record_as_first_thumbnail() {
    let h = harness();
    h.app.open_camera().await;
    let saved = h.app.take_photo().await;

    assert_eq!(saved.message, messages::PHOTO_SAVED);
    assert_eq!(saved.severity, Severity::Success);

    let records = h.store.list_all().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "2024-05-01T10:00:00.000Z");

    let gallery = h.app.gallery();
    assert_eq!(gallery.len(), 1);
    assert_eq!(gallery.first().unwrap().label(), records[0].id);

    let image = decode_image(&records[0].image_data).unwrap();
    assert_eq!((image.width(), image.height()), (48, 36));
}

#[tokio::test]
async fn test_capture_closes_camera() {
    let h = harness();
    h.app.open_camera().await;
    h.app.take_photo().await;

    assert!(!h.app.is_camera_open().await);
    let controls = h.app.controls().unwrap();
    assert!(controls.open_enabled);
    assert!(!controls.preview_visible);
    assert_eq!(controls.open_label, messages::OPEN_LABEL);
}

#[tokio::test]
async fn test_capture_without_session_changes_nothing() {
    let h = harness();
    let notification = h.app.take_photo().await;

    assert_eq!(notification.message, messages::OPEN_CAMERA_FIRST);
    assert!(notification.is_failure());
    assert_eq!(h.app.notifier().history().len(), 1);
    assert_eq!(h.store.count().await.unwrap(), 0);
    assert!(h.app.gallery().is_empty());
    assert_eq!(h.backend.stats().opened(), 0);
}

#[tokio::test]
async fn test_front_camera_toggle_then_capture() {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    let backend = VirtualCameraBackend::new();
    let store = PhotoStore::open_in_memory().unwrap();
    let app = PhotoApp::builder(Arc::new(backend.clone()), store.clone())
        .facing(FacingMode::User)
        .ideal_size(48, 36)
        .clock(StepClock::starting_at(start))
        .build();

    app.open_camera().await;
    assert_eq!(backend.stats().last_facing(), Some(FacingMode::User));

    let toggled = app.toggle_camera().await;
    assert_eq!(toggled.message, messages::CAMERA_OPENED);
    assert_eq!(backend.stats().last_facing(), Some(FacingMode::Environment));

    app.take_photo().await;

    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(app.gallery().len(), 1);
    assert!(!app.is_camera_open().await);
    assert_eq!(backend.stats().opened(), 2);
    assert_eq!(backend.stats().stop_calls(), 2);
}

#[tokio::test]
async fn test_two_sessions_rehydrate_newest_first() {
    let h = harness();
    for _ in 0..2 {
        h.app.open_camera().await;
        h.app.take_photo().await;
    }

    assert_eq!(h.store.count().await.unwrap(), 2);
    assert_eq!(h.app.hydrate().await, None);

    let mut records = h.store.list_all().await.unwrap();
    records.sort_by(|a, b| b.captured_at_ms.cmp(&a.captured_at_ms));
    let expected: Vec<String> = records.into_iter().map(|r| r.id).collect();

    let gallery = h.app.gallery();
    assert_eq!(gallery.ids(), expected);
    assert_eq!(gallery.ids()[0], "2024-05-01T10:00:01.000Z");
}

#[tokio::test]
async fn test_every_stream_stopped_once() {
    let h = harness();
    h.app.open_camera().await;
    h.app.open_camera().await;
    h.app.toggle_camera().await;
    h.app.take_photo().await;
    h.app.open_camera().await;
    h.app.toggle_camera().await;
    h.app.shutdown().await;
    h.app.shutdown().await;

    let stats = h.backend.stats();
    assert_eq!(stats.opened(), 4);
    assert_eq!(stats.stop_calls(), 4);
    assert_eq!(stats.active(), 0);
}

#[tokio::test]
async fn test_overlapping_captures_write_one_record() {
    let h = harness();
    h.app.open_camera().await;

    let (first, second) = tokio::join!(h.app.take_photo(), h.app.take_photo());

    assert_eq!(first.message, messages::PHOTO_SAVED);
    assert_eq!(second.message, messages::CAPTURE_IN_PROGRESS);
    assert_eq!(second.severity, Severity::Info);
    assert_eq!(h.store.count().await.unwrap(), 1);
    assert_eq!(h.app.gallery().len(), 1);
    assert!(!h.app.is_capturing());
}

#[tokio::test]
async fn test_capture_failure_still_closes_camera() {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    let h = harness_with(
        VirtualCameraOptions {
            produce_frames: false,
            ..Default::default()
        },
        StepClock::starting_at(start),
    );

    h.app.open_camera().await;
    let notification = h.app.take_photo().await;

    assert_eq!(notification.message, messages::PHOTO_SAVE_FAILED);
    assert_eq!(h.store.count().await.unwrap(), 0);
    assert!(h.app.gallery().is_empty());
    assert!(!h.app.is_camera_open().await);
    assert_eq!(h.backend.stats().active(), 0);
}

#[tokio::test]
async fn test_duplicate_id_is_reported_and_not_shown() {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    let h = harness_with(VirtualCameraOptions::default(), Arc::new(FrozenClock(at)));

    h.app.open_camera().await;
    assert_eq!(h.app.take_photo().await.message, messages::PHOTO_SAVED);
    h.app.open_camera().await;
    let second = h.app.take_photo().await;

    assert_eq!(second.message, messages::PHOTO_SAVE_FAILED);
    assert_eq!(h.store.count().await.unwrap(), 1);
    assert_eq!(h.app.gallery().len(), 1);
    assert!(!h.app.is_camera_open().await);
}

#[tokio::test]
async fn test_clear_gallery() {
    let h = harness();
    h.app.open_camera().await;
    h.app.take_photo().await;

    let cleared = h.app.clear_gallery().await;
    assert_eq!(cleared.message, messages::GALLERY_CLEARED);
    assert_eq!(cleared.severity, Severity::Info);
    assert!(h.store.list_all().await.unwrap().is_empty());
    assert!(h.app.gallery().is_empty());

    h.app.hydrate().await;
    assert_eq!(h.app.gallery().len(), 0);
}

#[tokio::test]
async fn test_clear_empty_gallery_is_noop() {
    let h = harness();
    assert_eq!(
        h.store.clear_all().await.unwrap(),
        ClearOutcome::EmptyStoreNoop
    );

    let notification = h.app.clear_gallery().await;
    assert_eq!(notification.message, messages::NOTHING_TO_CLEAR);
    assert_eq!(notification.severity, Severity::Muted);
}

#[tokio::test]
async fn test_open_failure_reports_and_holds_nothing() {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    let h = harness_with(
        VirtualCameraOptions {
            devices: 0,
            ..Default::default()
        },
        StepClock::starting_at(start),
    );

    let notification = h.app.open_camera().await;
    assert_eq!(notification.message, messages::CAMERA_OPEN_FAILED);
    assert!(!h.app.is_camera_open().await);

    let photo = h.app.take_photo().await;
    assert_eq!(photo.message, messages::OPEN_CAMERA_FIRST);
}

#[tokio::test]
async fn test_single_device_serves_both_facings() {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    let h = harness_with(
        VirtualCameraOptions {
            devices: 1,
            ..Default::default()
        },
        StepClock::starting_at(start),
    );

    assert_eq!(h.app.facing().await, FacingMode::Environment);
    assert_eq!(h.app.open_camera().await.severity, Severity::Success);
    assert_eq!(h.app.take_photo().await.message, messages::PHOTO_SAVED);
}
