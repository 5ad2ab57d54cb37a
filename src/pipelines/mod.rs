// SPDX-License-Identifier: MPL-2.0

//! Processing pipelines
//!
//! Heavy work (rasterizing, PNG encoding) runs in background tasks so the
//! live preview keeps refreshing during a capture.
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Camera Frame │ ──▶ │  Photo Pipeline   │ ──▶ │ PhotoRecord  │
//! │   (RGBA)     │     │  - Rasterize      │     │ (PNG data    │
//! │              │     │  - PNG encoding   │     │  URL)        │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```

pub mod photo;
