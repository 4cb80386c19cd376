// SPDX-License-Identifier: MPL-2.0

//! Processing pipelines for icon generation
//!
//! # Pipeline Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Render Host  │ ──▶ │   Live Capture    │ ──▶ │              │
//! │  (scene)     │     │  - Frame + reset  │     │              │
//! │              │     │  - Center crop    │     │  Icon File   │
//! └──────────────┘     └───────────────────┘     │ JPEG/PNG/TGA │
//!                                                │              │
//! ┌──────────────┐     ┌───────────────────┐     │              │
//! │   Preview    │ ──▶ │  Preview Recolor  │ ──▶ │              │
//! │   Bitmaps    │     │  - Color keying   │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! Encoding runs on the blocking pool; everything else is one cooperative
//! task that suspends on frame boundaries.
//!
//! # Modules
//!
//! - [`icon`]: capture strategies, image transforms, encoding and the batch orchestrator

pub mod icon;
