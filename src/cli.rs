// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides headless versions of the photo booth actions:
//! - Listing available cameras
//! - Taking a photo into the gallery
//! - Listing and clearing the gallery

use photobooth::app::PhotoApp;
use photobooth::backends::camera::CameraBackend;
use photobooth::storage::PhotoStore;
use std::time::{Duration, Instant};

/// List all available cameras
pub fn list_cameras(backend: &dyn CameraBackend) -> Result<(), Box<dyn std::error::Error>> {
    let cameras = backend.enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras ({}):", backend.backend_type());
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        println!("      Path: {}", camera.path);
        if let Some(driver) = &camera.driver {
            println!("      Driver: {}", driver);
        }
        println!();
    }

    Ok(())
}

/// Open the camera, take one photo and store it
pub async fn take_photo(app: &PhotoApp) -> Result<(), Box<dyn std::error::Error>> {
    let opened = app.open_camera().await;
    println!("{}", opened.message);
    if opened.is_failure() {
        return Err(opened.message.into());
    }

    // Wait for the first frame (camera warm-up)
    let start = Instant::now();
    let timeout = Duration::from_secs(5);
    while app.preview_frame().is_none() && start.elapsed() < timeout {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    println!("Capturing...");
    let saved = app.take_photo().await;
    println!("{}", saved.message);
    if saved.is_failure() {
        return Err(saved.message.into());
    }

    if let Some(thumbnail) = app.gallery().first() {
        println!("Stored as {}", thumbnail.label());
    }
    Ok(())
}

/// Print every stored photo, newest first
pub async fn list_gallery(app: &PhotoApp) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(failed) = app.hydrate().await {
        return Err(failed.message.into());
    }

    let gallery = app.gallery();
    if gallery.is_empty() {
        println!("The gallery is empty.");
        return Ok(());
    }

    println!("Photos ({}):", gallery.len());
    for thumbnail in gallery.thumbnails() {
        let record = thumbnail.record();
        println!(
            "  {}  {} KiB",
            record.id,
            record.image_data.len().div_ceil(1024)
        );
    }

    Ok(())
}

/// Delete every stored photo
pub async fn clear_gallery(app: &PhotoApp) -> Result<(), Box<dyn std::error::Error>> {
    let notification = app.clear_gallery().await;
    println!("{}", notification.message);
    if notification.is_failure() {
        return Err(notification.message.into());
    }
    Ok(())
}

/// Open the photo store, reporting where it lives
pub fn open_store(path: &std::path::Path) -> Result<PhotoStore, Box<dyn std::error::Error>> {
    let store = PhotoStore::open(path)?;
    tracing::debug!(location = %store.location(), "Using photo store");
    Ok(store)
}
