// SPDX-License-Identifier: GPL-3.0-only

//! Exact-match color keying
//!
//! Replaces every pixel that is bit-for-bit equal to a key color. There is no
//! tolerance and no edge treatment: antialiased pixels blended between the
//! object and the background are not exact matches and keep their fringe.

use crate::backends::host::CaptureSurface;
use image::Rgba;
use tracing::debug;

/// Key color and its replacement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorKey {
    pub key: [u8; 4],
    pub replacement: [u8; 4],
}

impl ColorKey {
    pub fn new(key: Rgba<u8>, replacement: Rgba<u8>) -> Self {
        Self {
            key: key.0,
            replacement: replacement.0,
        }
    }

    /// Substitute in place, returning how many pixels were replaced
    ///
    /// Every pixel is visited; the result does not depend on visiting order.
    pub fn apply(&self, surface: &mut CaptureSurface) -> usize {
        let mut replaced = 0;
        for pixel in surface.pixels_mut() {
            if *pixel == self.key {
                *pixel = self.replacement;
                replaced += 1;
            }
        }

        debug!(
            replaced,
            key = ?self.key,
            replacement = ?self.replacement,
            "Color key applied"
        );
        replaced
    }
}
