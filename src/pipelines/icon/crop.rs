// SPDX-License-Identifier: GPL-3.0-only

//! Center crop extraction

use crate::backends::host::{CaptureSurface, Dimensions};
use crate::errors::CaptureError;
use image::imageops;

/// Top-left corner of a `target`-sized region centred in `source`
///
/// Uses `source/2 - target/2` with floor division on each term, so odd
/// differences round the same way every time. Returns `None` if the target
/// does not fit.
pub fn crop_origin(source: Dimensions, target: Dimensions) -> Option<(u32, u32)> {
    if !target.fits_within(source) {
        return None;
    }
    Some((
        source.width / 2 - target.width / 2,
        source.height / 2 - target.height / 2,
    ))
}

/// Extract a `target`-sized block from the center of `source`
///
/// The result owns its own pixel buffer. Targets larger than the source on
/// either axis are rejected, never clamped.
pub fn center_crop(
    source: &CaptureSurface,
    target: Dimensions,
) -> Result<CaptureSurface, CaptureError> {
    let (x, y) = crop_origin(source.dimensions(), target).ok_or(CaptureError::OutOfBounds {
        surface: source.dimensions(),
        target,
    })?;

    let block = imageops::crop_imm(source.image(), x, y, target.width, target.height).to_image();
    Ok(CaptureSurface::from_image(block))
}
