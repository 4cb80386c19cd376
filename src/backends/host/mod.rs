// SPDX-License-Identifier: GPL-3.0-only

//! Render host abstraction
//!
//! The capture pipelines never talk to an engine directly. Everything they need
//! from the outside world goes through the small traits in this module:
//!
//! - [`SceneHost`]: spawn and destroy objects
//! - [`RenderTarget`]: clear mode and clear color
//! - [`FrameSource`]: wait for a presented frame and read it back
//! - [`PreviewSource`]: pre-rendered preview bitmaps
//!
//! [`software::SoftwareHost`] implements the first three on the CPU and
//! [`software::FilePreviewSource`] serves previews from image files.

pub mod software;
pub mod types;

pub use software::{FilePreviewSource, SoftwareHost};
pub use types::{
    CaptureSurface, ClearMode, Dimensions, ObjectRef, Placement, PresentedFrame,
    RenderTargetState, Rotation, SpawnHandle,
};

use crate::errors::CaptureError;
use image::Rgba;
use std::future::Future;

/// Object lifecycle in the scene
pub trait SceneHost {
    /// Instantiate `object` at `placement`
    fn spawn(&mut self, object: &ObjectRef, placement: Placement)
    -> Result<SpawnHandle, CaptureError>;

    /// Remove a previously spawned object. Unknown handles are ignored.
    fn destroy(&mut self, handle: SpawnHandle);
}

/// Render-target clear control
pub trait RenderTarget {
    fn set_clear_mode(&mut self, mode: ClearMode);
    fn set_clear_color(&mut self, color: Rgba<u8>);

    /// Push a whole [`RenderTargetState`] to the target
    fn apply_state(&mut self, state: &RenderTargetState) {
        self.set_clear_color(state.clear_color);
        self.set_clear_mode(state.clear_mode);
    }
}

/// Frame presentation and read-back
pub trait FrameSource {
    /// Native render-target resolution (before supersampling)
    fn resolution(&self) -> Dimensions;

    /// Sequence number of the most recently presented frame
    fn frame_sequence(&self) -> u64;

    /// Suspend until the next frame has been composited and presented
    fn await_frame_end(&mut self) -> impl Future<Output = PresentedFrame>;

    /// Read back the last presented frame at `supersample` times the native resolution
    fn capture_frame(&mut self, supersample: u32) -> CaptureSurface;
}

/// Everything the live capture pipeline needs from a host
pub trait CaptureHost: SceneHost + RenderTarget + FrameSource {}

impl<T: SceneHost + RenderTarget + FrameSource> CaptureHost for T {}

/// Source of pre-rendered preview bitmaps
pub trait PreviewSource {
    /// Preview for `object`, or `None` if the host has none
    fn preview_bitmap(&mut self, object: &ObjectRef) -> Option<CaptureSurface>;
}
