// SPDX-License-Identifier: GPL-3.0-only

//! CPU reference host
//!
//! A tiny compositor that behaves like an engine's render target closely
//! enough to drive the live capture pipeline without a GPU:
//!
//! - Objects are sprite images, loaded from their asset file on first spawn
//!   or registered up front with [`SoftwareHost::register_sprite`].
//! - World units are pixels. A sprite is centred at the middle of the frame
//!   plus its x/y position (y up); sprites further away (larger z) are drawn
//!   first.
//! - [`ClearMode::DepthOnly`] leaves the color buffer untouched between
//!   frames, exactly like a depth-only camera clear. Whatever the previous
//!   frame drew stays visible until a color clear happens.
//! - Supersampled read-back is a nearest-neighbour upscale of the frame.

use super::types::{
    CaptureSurface, ClearMode, Dimensions, ObjectRef, Placement, PresentedFrame, Rotation,
    SpawnHandle,
};
use super::{FrameSource, PreviewSource, RenderTarget, SceneHost};
use crate::errors::CaptureError;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace, warn};

struct SceneObject {
    name: String,
    sprite: RgbaImage,
    placement: Placement,
}

/// Software render host
pub struct SoftwareHost {
    resolution: Dimensions,
    color_buffer: RgbaImage,
    clear_mode: ClearMode,
    clear_color: Rgba<u8>,
    sprites: HashMap<String, RgbaImage>,
    objects: BTreeMap<SpawnHandle, SceneObject>,
    next_handle: u64,
    sequence: u64,
}

impl SoftwareHost {
    /// Create a host whose color buffer starts out fully transparent
    pub fn new(resolution: Dimensions) -> Self {
        Self {
            resolution,
            color_buffer: RgbaImage::new(resolution.width, resolution.height),
            clear_mode: ClearMode::Color,
            clear_color: Rgba([0, 0, 0, 0]),
            sprites: HashMap::new(),
            objects: BTreeMap::new(),
            next_handle: 1,
            sequence: 0,
        }
    }

    /// Make `sprite` available for objects named `name` without touching the filesystem
    pub fn register_sprite(&mut self, name: impl Into<String>, sprite: RgbaImage) {
        self.sprites.insert(name.into(), sprite);
    }

    /// Number of objects currently in the scene
    pub fn spawned_count(&self) -> usize {
        self.objects.len()
    }

    pub fn clear_mode(&self) -> ClearMode {
        self.clear_mode
    }

    pub fn clear_color(&self) -> Rgba<u8> {
        self.clear_color
    }

    /// Composite and present one frame
    pub fn present(&mut self) -> PresentedFrame {
        if self.clear_mode == ClearMode::Color {
            let color = self.clear_color;
            self.color_buffer.pixels_mut().for_each(|p| *p = color);
        }

        let mut drawn: Vec<&SceneObject> = self.objects.values().collect();
        drawn.sort_by(|a, b| b.placement.position[2].total_cmp(&a.placement.position[2]));

        let Dimensions { width, height } = self.resolution;
        for object in drawn {
            let [x, y, _] = object.placement.position;
            let origin = (
                sprite_origin(width, x, object.sprite.width()),
                sprite_origin(height, -y, object.sprite.height()),
            );
            let (Some(left), Some(top)) = origin else {
                trace!(object = %object.name, x, y, "Sprite outside the frame");
                continue;
            };
            trace!(object = %object.name, left, top, "Drawing sprite");
            imageops::overlay(&mut self.color_buffer, &object.sprite, left, top);
        }

        self.sequence += 1;
        PresentedFrame {
            sequence: self.sequence,
        }
    }

    fn load_sprite(&mut self, object: &ObjectRef) -> Result<RgbaImage, CaptureError> {
        if let Some(sprite) = self.sprites.get(&object.name) {
            return Ok(sprite.clone());
        }

        let sprite = image::open(&object.path)
            .map_err(|e| CaptureError::SpawnFailed {
                job: object.name.clone(),
                reason: format!("{}: {}", object.path.display(), e),
            })?
            .to_rgba8();
        debug!(
            object = %object.name,
            width = sprite.width(),
            height = sprite.height(),
            "Loaded sprite"
        );
        self.sprites.insert(object.name.clone(), sprite.clone());
        Ok(sprite)
    }
}

/// Leading edge of a sprite of `extent` pixels centred `offset` pixels from the
/// middle of a `frame` pixel axis, `None` if no pixel of it lands in the frame
fn sprite_origin(frame: u32, offset: f32, extent: u32) -> Option<i64> {
    if !offset.is_finite() {
        return None;
    }
    let origin = (i64::from(frame) / 2)
        .checked_add(offset.round() as i64)?
        .checked_sub(i64::from(extent) / 2)?;
    let end = origin.checked_add(i64::from(extent))?;
    (origin < i64::from(frame) && end > 0).then_some(origin)
}

fn rotate(sprite: RgbaImage, rotation: Rotation) -> RgbaImage {
    match rotation {
        Rotation::None => sprite,
        Rotation::Rotate90 => imageops::rotate90(&sprite),
        Rotation::Rotate180 => imageops::rotate180(&sprite),
        Rotation::Rotate270 => imageops::rotate270(&sprite),
    }
}

impl SceneHost for SoftwareHost {
    fn spawn(
        &mut self,
        object: &ObjectRef,
        placement: Placement,
    ) -> Result<SpawnHandle, CaptureError> {
        let sprite = rotate(self.load_sprite(object)?, placement.rotation);
        let handle = SpawnHandle(self.next_handle);
        self.next_handle += 1;

        debug!(object = %object.name, handle = handle.0, ?placement, "Spawned object");
        self.objects.insert(
            handle,
            SceneObject {
                name: object.name.clone(),
                sprite,
                placement,
            },
        );
        Ok(handle)
    }

    fn destroy(&mut self, handle: SpawnHandle) {
        match self.objects.remove(&handle) {
            Some(object) => debug!(object = %object.name, handle = handle.0, "Destroyed object"),
            None => warn!(handle = handle.0, "Destroy called for unknown handle"),
        }
    }
}

impl RenderTarget for SoftwareHost {
    fn set_clear_mode(&mut self, mode: ClearMode) {
        self.clear_mode = mode;
    }

    fn set_clear_color(&mut self, color: Rgba<u8>) {
        self.clear_color = color;
    }
}

impl FrameSource for SoftwareHost {
    fn resolution(&self) -> Dimensions {
        self.resolution
    }

    fn frame_sequence(&self) -> u64 {
        self.sequence
    }

    async fn await_frame_end(&mut self) -> PresentedFrame {
        let frame = self.present();
        // Give the scheduler a chance to run, like a real end-of-frame wait
        tokio::task::yield_now().await;
        frame
    }

    fn capture_frame(&mut self, supersample: u32) -> CaptureSurface {
        let factor = supersample.max(1);
        if factor == 1 {
            return CaptureSurface::from_image(self.color_buffer.clone());
        }

        let Some(target) = self.resolution.checked_scaled(factor) else {
            warn!(
                factor,
                resolution = %self.resolution,
                "Supersampled size overflows, capturing at native size"
            );
            return CaptureSurface::from_image(self.color_buffer.clone());
        };
        CaptureSurface::from_image(imageops::resize(
            &self.color_buffer,
            target.width,
            target.height,
            FilterType::Nearest,
        ))
    }
}

/// Preview source that treats each object's asset file as its rendered preview
#[derive(Debug, Default)]
pub struct FilePreviewSource;

impl FilePreviewSource {
    pub fn new() -> Self {
        Self
    }
}

impl PreviewSource for FilePreviewSource {
    fn preview_bitmap(&mut self, object: &ObjectRef) -> Option<CaptureSurface> {
        match image::open(&object.path) {
            Ok(preview) => Some(CaptureSurface::from_image(preview.to_rgba8())),
            Err(e) => {
                warn!(
                    object = %object.name,
                    path = %object.path.display(),
                    error = %e,
                    "Preview unavailable"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const GREY: Rgba<u8> = Rgba([40, 40, 40, 255]);

    fn host_with_red_square() -> SoftwareHost {
        let mut host = SoftwareHost::new(Dimensions::new(8, 8));
        host.register_sprite("square", RgbaImage::from_pixel(2, 2, RED));
        host
    }

    #[test]
    fn test_color_clear_fills_buffer() {
        let mut host = SoftwareHost::new(Dimensions::new(4, 4));
        host.set_clear_color(GREY);
        host.set_clear_mode(ClearMode::Color);
        host.present();

        assert!(host.capture_frame(1).is_uniform(GREY));
    }

    #[test]
    fn test_sprite_is_centred() {
        let mut host = host_with_red_square();
        host.set_clear_color(GREY);
        let object = ObjectRef::new("square", "unused.png");
        host.spawn(&object, Placement::default()).unwrap();
        host.present();

        let frame = host.capture_frame(1);
        assert_eq!(frame.pixel(3, 3), RED);
        assert_eq!(frame.pixel(4, 4), RED);
        assert_eq!(frame.pixel(2, 2), GREY);
        assert_eq!(frame.pixel(5, 5), GREY);
    }

    #[test]
    fn test_depth_only_keeps_previous_pixels() {
        let mut host = host_with_red_square();
        let object = ObjectRef::new("square", "unused.png");
        let handle = host.spawn(&object, Placement::default()).unwrap();
        host.present();

        host.destroy(handle);
        host.set_clear_mode(ClearMode::DepthOnly);
        host.present();

        // Nothing is spawned any more, but the sprite is still in the buffer
        assert_eq!(host.spawned_count(), 0);
        assert_eq!(host.capture_frame(1).pixel(3, 3), RED);
    }

    #[test]
    fn test_nearer_objects_drawn_last() {
        let mut host = SoftwareHost::new(Dimensions::new(4, 4));
        host.register_sprite("red", RgbaImage::from_pixel(2, 2, RED));
        host.register_sprite("blue", RgbaImage::from_pixel(2, 2, BLUE));

        let near = Placement::new([0.0, 0.0, 1.0], Rotation::None);
        let far = Placement::new([0.0, 0.0, 5.0], Rotation::None);
        host.spawn(&ObjectRef::new("red", "r.png"), near).unwrap();
        host.spawn(&ObjectRef::new("blue", "b.png"), far).unwrap();
        host.present();

        assert_eq!(host.capture_frame(1).pixel(2, 2), RED);
    }

    #[test]
    fn test_sprite_origin() {
        assert_eq!(sprite_origin(8, 0.0, 2), Some(3));
        assert_eq!(sprite_origin(8, -3.4, 2), Some(0));
        // Partly visible on either edge
        assert_eq!(sprite_origin(8, 4.0, 2), Some(7));
        assert_eq!(sprite_origin(8, -4.0, 2), Some(-1));
        // Fully outside
        assert_eq!(sprite_origin(8, 5.0, 2), None);
        assert_eq!(sprite_origin(8, -5.0, 2), None);
        assert_eq!(sprite_origin(8, 3.0e38, 2), None);
        assert_eq!(sprite_origin(8, -3.0e38, 2), None);
        assert_eq!(sprite_origin(8, f32::NAN, 2), None);
        assert_eq!(sprite_origin(8, f32::INFINITY, 2), None);
    }

    #[test]
    fn test_far_off_sprite_not_drawn() {
        let mut host = host_with_red_square();
        host.set_clear_color(GREY);
        let object = ObjectRef::new("square", "unused.png");
        host.spawn(&object, Placement::new([f32::MAX, f32::NAN, 0.0], Rotation::None))
            .unwrap();
        host.present();

        assert!(host.capture_frame(1).is_uniform(GREY));
    }

    #[test]
    fn test_supersampled_capture_dimensions() {
        let mut host = SoftwareHost::new(Dimensions::new(6, 4));
        host.present();
        assert_eq!(host.capture_frame(0).dimensions(), Dimensions::new(6, 4));
        assert_eq!(host.capture_frame(3).dimensions(), Dimensions::new(18, 12));
    }

    #[test]
    fn test_sequence_increments() {
        let mut host = SoftwareHost::new(Dimensions::new(2, 2));
        assert_eq!(host.frame_sequence(), 0);
        assert_eq!(host.present().sequence, 1);
        assert_eq!(host.present().sequence, 2);
        assert_eq!(host.frame_sequence(), 2);
    }

    #[test]
    fn test_spawn_missing_asset_fails() {
        let mut host = SoftwareHost::new(Dimensions::new(2, 2));
        let object = ObjectRef::new("ghost", "/nonexistent/ghost.png");
        let result = host.spawn(&object, Placement::default());
        assert!(matches!(result, Err(CaptureError::SpawnFailed { .. })));
    }

    #[test]
    fn test_file_preview_missing() {
        let mut source = FilePreviewSource::new();
        let object = ObjectRef::new("ghost", "/nonexistent/ghost.png");
        assert!(source.preview_bitmap(&object).is_none());
    }
}
