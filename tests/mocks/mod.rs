// SPDX-License-Identifier: GPL-3.0-only

//! Mock infrastructure for testing
//!
//! Surface builders, an in-memory preview source and a host wrapper that
//! records every call the capture protocol makes.

#![allow(dead_code)]

use icon_capture::backends::host::{
    CaptureSurface, ClearMode, Dimensions, FrameSource, ObjectRef, Placement, PresentedFrame,
    PreviewSource, RenderTarget, SceneHost, SoftwareHost, SpawnHandle,
};
use icon_capture::errors::CaptureError;
use image::{Rgba, RgbaImage};
use std::collections::HashMap;

pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
pub const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
pub const GREY: Rgba<u8> = Rgba([82, 82, 82, 255]);
pub const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Surface whose every pixel encodes its own coordinates
///
/// Pixel (x, y) is `[x, y, x ^ y, 255]`, truncated to bytes.
pub fn coordinate_surface(width: u32, height: u32) -> CaptureSurface {
    CaptureSurface::from_image(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([x as u8, y as u8, (x ^ y) as u8, 255])
    }))
}

/// `inner` square of side `size` centred on a `background` surface
pub fn framed_surface(
    width: u32,
    height: u32,
    background: Rgba<u8>,
    inner: Rgba<u8>,
    size: u32,
) -> CaptureSurface {
    let left = (width - size) / 2;
    let top = (height - size) / 2;
    CaptureSurface::from_image(RgbaImage::from_fn(width, height, |x, y| {
        if (left..left + size).contains(&x) && (top..top + size).contains(&y) {
            inner
        } else {
            background
        }
    }))
}

/// Count pixels equal to `color`
pub fn count_pixels(surface: &CaptureSurface, color: Rgba<u8>) -> usize {
    surface.image().pixels().filter(|p| **p == color).count()
}

/// Preview bitmaps held in memory, keyed by object name
#[derive(Default)]
pub struct MapPreviewSource {
    previews: HashMap<String, CaptureSurface>,
    pub requests: Vec<String>,
}

impl MapPreviewSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preview(mut self, name: &str, preview: CaptureSurface) -> Self {
        self.previews.insert(name.to_string(), preview);
        self
    }
}

impl PreviewSource for MapPreviewSource {
    fn preview_bitmap(&mut self, object: &ObjectRef) -> Option<CaptureSurface> {
        self.requests.push(object.name.clone());
        self.previews.get(&object.name).map(|p| p.copy_pixels())
    }
}

/// A call made to the host
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Spawn { object: String, placement: Placement },
    Destroy(SpawnHandle),
    ClearMode(ClearMode),
    ClearColor(Rgba<u8>),
    Presented(u64),
    Captured { after_frame: u64 },
}

/// [`SoftwareHost`] wrapper recording every call
pub struct RecordingHost {
    pub inner: SoftwareHost,
    pub events: Vec<HostEvent>,
}

impl RecordingHost {
    pub fn new(resolution: Dimensions) -> Self {
        Self {
            inner: SoftwareHost::new(resolution),
            events: Vec::new(),
        }
    }

    pub fn with_sprite(mut self, name: &str, sprite: RgbaImage) -> Self {
        self.inner.register_sprite(name, sprite);
        self
    }

    /// Events with clear colors filtered out
    pub fn protocol_events(&self) -> Vec<HostEvent> {
        self.events
            .iter()
            .filter(|e| !matches!(e, HostEvent::ClearColor(_)))
            .cloned()
            .collect()
    }

    pub fn spawn_placements(&self) -> Vec<Placement> {
        self.events
            .iter()
            .filter_map(|e| match e {
                HostEvent::Spawn { placement, .. } => Some(*placement),
                _ => None,
            })
            .collect()
    }
}

impl SceneHost for RecordingHost {
    fn spawn(
        &mut self,
        object: &ObjectRef,
        placement: Placement,
    ) -> Result<SpawnHandle, CaptureError> {
        self.events.push(HostEvent::Spawn {
            object: object.name.clone(),
            placement,
        });
        self.inner.spawn(object, placement)
    }

    fn destroy(&mut self, handle: SpawnHandle) {
        self.events.push(HostEvent::Destroy(handle));
        self.inner.destroy(handle);
    }
}

impl RenderTarget for RecordingHost {
    fn set_clear_mode(&mut self, mode: ClearMode) {
        self.events.push(HostEvent::ClearMode(mode));
        self.inner.set_clear_mode(mode);
    }

    fn set_clear_color(&mut self, color: Rgba<u8>) {
        self.events.push(HostEvent::ClearColor(color));
        self.inner.set_clear_color(color);
    }
}

impl FrameSource for RecordingHost {
    fn resolution(&self) -> Dimensions {
        self.inner.resolution()
    }

    fn frame_sequence(&self) -> u64 {
        self.inner.frame_sequence()
    }

    async fn await_frame_end(&mut self) -> PresentedFrame {
        let frame = self.inner.await_frame_end().await;
        self.events.push(HostEvent::Presented(frame.sequence));
        frame
    }

    fn capture_frame(&mut self, supersample: u32) -> CaptureSurface {
        self.events.push(HostEvent::Captured {
            after_frame: self.inner.frame_sequence(),
        });
        self.inner.capture_frame(supersample)
    }
}
