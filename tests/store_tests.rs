// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the photo store

use chrono::{TimeZone, Utc};
use photobooth::app::GalleryView;
use photobooth::errors::StoreError;
use photobooth::storage::{ClearOutcome, PhotoRecord, PhotoStore};

fn record(second: u32) -> PhotoRecord {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, second).unwrap();
    PhotoRecord::new(at, format!("data:image/png;base64,{}", second))
}

#[tokio::test]
async fn test_duplicate_put_conflicts_and_keeps_original() {
    let store = PhotoStore::open_in_memory().unwrap();
    let original = record(1);
    store.put(original.clone()).await.unwrap();

    let mut duplicate = record(1);
    duplicate.image_data = "data:image/png;base64,other".to_string();
    assert_eq!(
        store.put(duplicate).await,
        Err(StoreError::Conflict(original.id.clone()))
    );

    assert_eq!(store.list_all().await.unwrap(), vec![original]);
}

#[tokio::test]
async fn test_sorted_listing_matches_gallery_order() {
    let store = PhotoStore::open_in_memory().unwrap();
    for second in [7, 2, 9, 4] {
        store.put(record(second)).await.unwrap();
    }

    let mut records = store.list_all().await.unwrap();
    let mut gallery = GalleryView::new();
    gallery.hydrate(records.clone());

    records.sort_by(|a, b| b.captured_at_ms.cmp(&a.captured_at_ms));
    let expected: Vec<String> = records.into_iter().map(|r| r.id).collect();
    assert_eq!(gallery.ids(), expected);
    assert_eq!(gallery.ids()[0], "2024-05-01T10:00:09.000Z");
}

#[tokio::test]
async fn test_clear_then_hydrate_is_empty() {
    let store = PhotoStore::open_in_memory().unwrap();
    store.put(record(1)).await.unwrap();
    store.put(record(2)).await.unwrap();

    assert_eq!(
        store.clear_all().await.unwrap(),
        ClearOutcome::Cleared { removed: 2 }
    );

    let mut gallery = GalleryView::new();
    gallery.hydrate(store.list_all().await.unwrap());
    assert!(gallery.is_empty());

    assert_eq!(store.clear_all().await.unwrap(), ClearOutcome::EmptyStoreNoop);
}

#[tokio::test]
async fn test_clones_share_one_database() {
    let store = PhotoStore::open_in_memory().unwrap();
    let other = store.clone();
    store.put(record(3)).await.unwrap();
    assert_eq!(other.count().await.unwrap(), 1);
}
