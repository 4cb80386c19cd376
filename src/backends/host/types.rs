// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for render hosts

use crate::errors::CaptureError;
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Width and height of a surface, icon or render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True if either side is zero
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether `self` fits inside `other` on both axes
    pub fn fits_within(&self, other: Dimensions) -> bool {
        self.width <= other.width && self.height <= other.height
    }

    /// Scale both sides by an integer factor, `None` on overflow
    pub fn checked_scaled(&self, factor: u32) -> Option<Dimensions> {
        Some(Dimensions::new(
            self.width.checked_mul(factor)?,
            self.height.checked_mul(factor)?,
        ))
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Dimensions {
    type Err = String;

    /// Parse `WIDTHxHEIGHT`, e.g. `256x256`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
        let width = w
            .trim()
            .parse()
            .map_err(|e| format!("invalid width '{}': {}", w, e))?;
        let height = h
            .trim()
            .parse()
            .map_err(|e| format!("invalid height '{}': {}", h, e))?;
        Ok(Dimensions::new(width, height))
    }
}

/// An RGBA pixel grid produced by frame or preview acquisition
///
/// A surface has exactly one owner at a time. It is handed from step to step
/// by value and dropped after encoding; copies are only made explicitly with
/// [`CaptureSurface::copy_pixels`].
#[derive(PartialEq, Eq)]
pub struct CaptureSurface {
    image: RgbaImage,
}

impl CaptureSurface {
    /// Create a surface filled with a single color
    pub fn filled(width: u32, height: u32, color: Rgba<u8>) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, color),
        }
    }

    /// Wrap raw RGBA bytes (4 bytes per pixel, row-major, top row first)
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CaptureError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(CaptureError::InvalidSurface(format!(
                "expected {} bytes for {}x{}, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }

        RgbaImage::from_raw(width, height, data)
            .map(Self::from_image)
            .ok_or_else(|| CaptureError::InvalidSurface("buffer rejected".to_string()))
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.image.width(), self.image.height())
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.image.get_pixel(x, y)
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        self.image.put_pixel(x, y, color);
    }

    /// Raw RGBA bytes
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Pixels as 4-byte arrays, for pointwise transforms
    pub fn pixels_mut(&mut self) -> &mut [[u8; 4]] {
        bytemuck::cast_slice_mut(&mut *self.image)
    }

    /// Whether every pixel equals `color`
    pub fn is_uniform(&self, color: Rgba<u8>) -> bool {
        self.image.pixels().all(|p| *p == color)
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Deep copy into a fresh, unshared buffer
    pub fn copy_pixels(&self) -> CaptureSurface {
        let mut image = RgbaImage::new(self.width(), self.height());
        image.copy_from_slice(self.image.as_raw());
        CaptureSurface { image }
    }
}

impl std::fmt::Debug for CaptureSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CaptureSurface({}x{}, {} bytes)",
            self.width(),
            self.height(),
            self.image.len()
        )
    }
}

/// How the render target is cleared before each frame is composited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClearMode {
    /// Fill the color buffer with the clear color
    Color,
    /// Only reset depth; the color buffer keeps whatever was there
    DepthOnly,
}

/// Handle returned by a scene for a spawned object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpawnHandle(pub u64);

/// Render-target state shared by every capture in a batch
///
/// Passed into each capture by value and handed back once cleanup has
/// finished, so the next capture always starts from a known state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTargetState {
    pub clear_mode: ClearMode,
    pub clear_color: Rgba<u8>,
    /// Object currently spawned for capture, if any
    pub spawned: Option<SpawnHandle>,
}

impl RenderTargetState {
    pub fn new(clear_mode: ClearMode, clear_color: Rgba<u8>) -> Self {
        Self {
            clear_mode,
            clear_color,
            spawned: None,
        }
    }
}

/// Reference to a source object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Object name, used to look up registered sprites and in log output
    pub name: String,
    /// Asset file backing the object
    pub path: PathBuf,
}

impl ObjectRef {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Object rotation around the view axis, in quarter turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    None,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Rotation {
    /// Snap an integer degree value to the nearest quarter turn (normalised to 0-360)
    pub fn from_degrees_int(degrees: i32) -> Self {
        match ((degrees.rem_euclid(360) + 45) / 90) % 4 {
            1 => Rotation::Rotate90,
            2 => Rotation::Rotate180,
            3 => Rotation::Rotate270,
            _ => Rotation::None,
        }
    }
}

/// Where an object is spawned
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Placement {
    /// World position; x right, y up, z away from the viewer
    pub position: [f32; 3],
    pub rotation: Rotation,
}

impl Placement {
    pub fn new(position: [f32; 3], rotation: Rotation) -> Self {
        Self { position, rotation }
    }

    /// Same placement pushed `offset` units along the depth axis
    pub fn offset_depth(&self, offset: f32) -> Self {
        let [x, y, z] = self.position;
        Self {
            position: [x, y, z + offset],
            rotation: self.rotation,
        }
    }
}

/// Proof that the host finished compositing and presenting a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PresentedFrame {
    /// Monotonically increasing frame number
    pub sequence: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_parse() {
        assert_eq!(
            "256x128".parse::<Dimensions>(),
            Ok(Dimensions::new(256, 128))
        );
        assert_eq!(" 64 X 32 ".parse::<Dimensions>(), Ok(Dimensions::new(64, 32)));
        assert!("256".parse::<Dimensions>().is_err());
        assert!("ax2".parse::<Dimensions>().is_err());
    }

    #[test]
    fn test_dimensions_fit() {
        let icon = Dimensions::new(256, 256);
        assert!(icon.fits_within(Dimensions::new(256, 256)));
        assert!(icon.fits_within(Dimensions::new(512, 300)));
        assert!(!icon.fits_within(Dimensions::new(255, 1024)));
        assert_eq!(
            Dimensions::new(100, 50).checked_scaled(2),
            Some(Dimensions::new(200, 100))
        );
        assert_eq!(Dimensions::new(1024, 1).checked_scaled(u32::MAX), None);
    }

    #[test]
    fn test_surface_from_raw_checks_length() {
        assert!(CaptureSurface::from_raw(2, 2, vec![0u8; 16]).is_ok());
        assert!(matches!(
            CaptureSurface::from_raw(2, 2, vec![0u8; 15]),
            Err(CaptureError::InvalidSurface(_))
        ));
    }

    #[test]
    fn test_copy_pixels_is_independent() {
        let original = CaptureSurface::filled(4, 4, Rgba([1, 2, 3, 4]));
        let mut copy = original.copy_pixels();
        copy.put_pixel(0, 0, Rgba([9, 9, 9, 9]));

        assert_eq!(original.pixel(0, 0), Rgba([1, 2, 3, 4]));
        assert_eq!(copy.pixel(0, 0), Rgba([9, 9, 9, 9]));
    }

    #[test]
    fn test_rotation_from_degrees() {
        assert_eq!(Rotation::from_degrees_int(0), Rotation::None);
        assert_eq!(Rotation::from_degrees_int(90), Rotation::Rotate90);
        assert_eq!(Rotation::from_degrees_int(-90), Rotation::Rotate270);
        assert_eq!(Rotation::from_degrees_int(180), Rotation::Rotate180);
        assert_eq!(Rotation::from_degrees_int(100), Rotation::Rotate90);
        assert_eq!(Rotation::from_degrees_int(350), Rotation::None);
        assert_eq!(Rotation::from_degrees_int(450), Rotation::Rotate90);
    }
}
