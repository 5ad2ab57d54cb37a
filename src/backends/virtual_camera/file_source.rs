// SPDX-License-Identifier: GPL-3.0-only

//! Still-image frame source for the virtual camera

use crate::backends::camera::types::{BackendError, BackendResult, CameraFrame};
use std::path::Path;
use tracing::info;

/// Load an image file (any format the `image` crate decodes) as an RGBA frame
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    info!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(io) => BackendError::from_io(&path.display().to_string(), &io),
        other => BackendError::Other(format!(
            "Failed to load image '{}': {}",
            path.display(),
            other
        )),
    })?;

    let rgba = img.to_rgba8();
    let width = rgba.width();
    let height = rgba.height();

    info!(width, height, "Image loaded successfully");

    Ok(CameraFrame::from_rgba(width, height, rgba.into_raw()))
}
