// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use crate::backends::host::Dimensions;
use image::Rgba;

/// Output folder, created beside the assets directory
pub const DEFAULT_FOLDER_NAME: &str = "Generated Icons";

/// Base file name for live captures
pub const DEFAULT_LIVE_FILE_NAME: &str = "Advanced Icon";

/// Base file name for recolored previews
pub const DEFAULT_PREVIEW_FILE_NAME: &str = "Simple Icon";

/// Default icon size
pub const DEFAULT_ICON_SIZE: Dimensions = Dimensions::new(256, 256);

/// Native resolution of the software render host
pub const DEFAULT_RENDER_RESOLUTION: Dimensions = Dimensions::new(1024, 1024);

/// Largest width or height of a supersampled capture
pub const MAX_CAPTURE_DIMENSION: u32 = 16384;

/// Largest absolute anchor coordinate or depth offset, in world units
pub const MAX_PLACEMENT_COORDINATE: f32 = 1.0e6;

/// Solid background for live capture
pub const DEFAULT_BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Background color of generated preview thumbnails
///
/// Previews are rendered against this exact grey, which makes it the default
/// key color for recoloring.
pub const PREVIEW_BACKGROUND: Rgba<u8> = Rgba([82, 82, 82, 255]);

/// JPEG quality presets (0-100)
pub mod jpeg_quality {
    pub const LOW: u8 = 60;
    pub const MEDIUM: u8 = 80;
    pub const HIGH: u8 = 92;
    pub const MAXIMUM: u8 = 98;
}
