// SPDX-License-Identifier: MPL-2.0

//! Photo booth - take photos with a camera and keep them in a local gallery
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Application core (camera controller, gallery, notifications)
//! - [`backends`]: Camera backend abstraction (V4L2 and virtual)
//! - [`pipelines`]: Photo capture pipeline
//! - [`storage`]: Embedded photo document store
//! - [`config`]: User configuration handling
//! - [`terminal`]: Interactive terminal front end
//!
//! # Example
//!
//! ```ignore
//! let store = PhotoStore::open_in_memory()?;
//! let app = PhotoApp::builder(Arc::new(VirtualCameraBackend::new()), store).build();
//! app.open_camera().await;
//! app.take_photo().await;
//! ```

pub mod app;
pub mod assets;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{Message, Notification, PhotoApp, Severity};
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use storage::{ClearOutcome, PhotoRecord, PhotoStore};
