// SPDX-License-Identifier: GPL-3.0-only

//! Gallery view model
//!
//! Thumbnails are kept newest-first. Decoding the embedded image is deferred
//! until a thumbnail is first drawn.

use crate::errors::PhotoError;
use crate::pipelines::photo::decode_image;
use crate::storage::PhotoRecord;
use image::RgbaImage;
use image::imageops::FilterType;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Longest edge of a decoded thumbnail
pub const THUMBNAIL_SIZE: u32 = 160;

/// One entry of the gallery
#[derive(Debug, Clone)]
pub struct Thumbnail {
    record: Arc<PhotoRecord>,
    preview: Arc<OnceLock<Option<RgbaImage>>>,
}

impl Thumbnail {
    pub fn new(record: PhotoRecord) -> Self {
        Self {
            record: Arc::new(record),
            preview: Arc::new(OnceLock::new()),
        }
    }

    /// Label shown with the thumbnail (the record id)
    pub fn label(&self) -> &str {
        &self.record.id
    }

    pub fn record(&self) -> &PhotoRecord {
        &self.record
    }

    /// Whether the image has been decoded yet
    pub fn is_loaded(&self) -> bool {
        self.preview.get().is_some()
    }

    /// Decoded, downscaled preview; decoded on first access
    pub fn preview(&self) -> Option<&RgbaImage> {
        self.preview
            .get_or_init(|| match decode_image(&self.record.image_data) {
                Ok(image) => {
                    debug!(id = %self.record.id, "Thumbnail decoded");
                    Some(image.resize(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Triangle).to_rgba8())
                }
                Err(e) => {
                    warn!(id = %self.record.id, error = %e, "Thumbnail cannot be decoded");
                    None
                }
            })
            .as_ref()
    }

    /// Write the full image to `dir` and hand it to the system viewer
    pub fn open_full(&self, dir: &Path) -> Result<PathBuf, PhotoError> {
        let path = self.export(dir)?;
        open::that_detached(&path)?;
        info!(path = %path.display(), "Opened photo in viewer");
        Ok(path)
    }

    /// Write the full image to `dir` as `<id>.png`
    pub fn export(&self, dir: &Path) -> Result<PathBuf, PhotoError> {
        let (_mime, bytes) = crate::pipelines::photo::decode_data_url(&self.record.image_data)?;
        std::fs::create_dir_all(dir)?;

        // Colons are not portable in file names
        let path = dir.join(format!("{}.png", self.record.id.replace(':', "-")));
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

/// Gallery view
#[derive(Debug, Default)]
pub struct GalleryView {
    thumbnails: VecDeque<Thumbnail>,
    selected: usize,
    scroll_offset: usize,
}

impl GalleryView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the content with `records`, newest first
    pub fn hydrate(&mut self, mut records: Vec<PhotoRecord>) {
        records.sort_by(|a, b| b.captured_at_ms.cmp(&a.captured_at_ms));
        self.thumbnails = records.into_iter().map(Thumbnail::new).collect();
        self.selected = 0;
        self.scroll_offset = 0;
        info!(count = self.thumbnails.len(), "Gallery hydrated");
    }

    /// Insert one thumbnail at the start and scroll back to it
    pub fn prepend(&mut self, record: PhotoRecord) {
        self.thumbnails.push_front(Thumbnail::new(record));
        self.selected = 0;
        self.scroll_offset = 0;
    }

    /// Remove every thumbnail
    pub fn clear(&mut self) {
        self.thumbnails.clear();
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn len(&self) -> usize {
        self.thumbnails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thumbnails.is_empty()
    }

    /// Thumbnails in display order
    pub fn thumbnails(&self) -> impl Iterator<Item = &Thumbnail> {
        self.thumbnails.iter()
    }

    /// Ids in display order
    pub fn ids(&self) -> Vec<String> {
        self.thumbnails.iter().map(|t| t.label().to_string()).collect()
    }

    pub fn first(&self) -> Option<&Thumbnail> {
        self.thumbnails.front()
    }

    pub fn selected_index(&self) -> Option<usize> {
        (!self.thumbnails.is_empty()).then_some(self.selected)
    }

    pub fn selected(&self) -> Option<&Thumbnail> {
        self.thumbnails.get(self.selected)
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.thumbnails.len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Keep the selection inside a window of `rows` visible entries
    pub fn scroll_to_selection(&mut self, rows: usize) {
        if rows == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + rows {
            self.scroll_offset = self.selected + 1 - rows;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::photo::PhotoEncoder;

    fn record(ms: i64) -> PhotoRecord {
        let image = RgbaImage::from_pixel(8, 8, image::Rgba([200, 10, 10, 255]));
        let data = PhotoEncoder::encode_png(&image).unwrap().to_data_url();
        PhotoRecord {
            id: format!("id-{}", ms),
            captured_at_ms: ms,
            image_data: data,
        }
    }

    #[test]
    fn test_hydrate_sorts_newest_first() {
        let mut gallery = GalleryView::new();
        gallery.hydrate(vec![record(2), record(3), record(1)]);
        assert_eq!(gallery.ids(), vec!["id-3", "id-2", "id-1"]);

        // Hydrating again replaces instead of appending
        gallery.hydrate(vec![record(5)]);
        assert_eq!(gallery.ids(), vec!["id-5"]);
    }

    #[test]
    fn test_prepend_resets_scroll() {
        let mut gallery = GalleryView::new();
        gallery.hydrate((1..=10).map(record).collect());
        for _ in 0..8 {
            gallery.select_next();
        }
        gallery.scroll_to_selection(3);
        assert_eq!(gallery.scroll_offset(), 6);

        gallery.prepend(record(11));
        assert_eq!(gallery.first().map(|t| t.label()), Some("id-11"));
        assert_eq!(gallery.scroll_offset(), 0);
        assert_eq!(gallery.selected_index(), Some(0));
    }

    #[test]
    fn test_selection_is_clamped() {
        let mut gallery = GalleryView::new();
        assert_eq!(gallery.selected_index(), None);

        gallery.hydrate(vec![record(1), record(2)]);
        gallery.select_previous();
        assert_eq!(gallery.selected_index(), Some(0));
        gallery.select_next();
        gallery.select_next();
        assert_eq!(gallery.selected().map(|t| t.label()), Some("id-1"));

        gallery.clear();
        assert!(gallery.is_empty());
        assert!(gallery.selected().is_none());
    }

    #[test]
    fn test_thumbnail_decodes_lazily() {
        let thumbnail = Thumbnail::new(record(1));
        assert!(!thumbnail.is_loaded());
        let preview = thumbnail.preview().unwrap();
        assert_eq!(preview.get_pixel(0, 0).0, [200, 10, 10, 255]);
        assert!(thumbnail.is_loaded());

        let broken = Thumbnail::new(PhotoRecord {
            id: "broken".into(),
            captured_at_ms: 0,
            image_data: "data:image/png;base64,AAAA".into(),
        });
        assert!(broken.preview().is_none());
    }

    #[test]
    fn test_export_writes_png() {
        let dir = std::env::temp_dir().join(format!("photobooth-export-{}", std::process::id()));
        let thumbnail = Thumbnail::new(PhotoRecord {
            id: "2024-05-01T10:20:30.123Z".into(),
            ..record(1)
        });

        let path = thumbnail.export(&dir).unwrap();
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("2024-05-01T10-20-30.123Z.png")
        );
        let image = image::open(&path).unwrap();
        assert_eq!(image.width(), 8);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
