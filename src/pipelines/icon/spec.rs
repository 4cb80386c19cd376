// SPDX-License-Identifier: GPL-3.0-only

//! Icon specification and jobs
//!
//! One [`IconSpec`] governs every job in a batch. It can only be built through
//! validating constructors, so an invalid combination never reaches capture.

use super::encoding::{EncodingQuality, IconEncoder, IconFormat};
use super::keying::ColorKey;
use crate::backends::host::{Dimensions, ObjectRef};
use crate::constants::MAX_CAPTURE_DIMENSION;
use crate::errors::ConfigError;
use image::Rgba;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// Background of a live capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundMode {
    /// Clear to the background color every frame
    #[default]
    Solid,
    /// Depth-only clear; pixels outside the object keep zero alpha
    Transparent,
}

impl FromStr for BackgroundMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solid" => Ok(BackgroundMode::Solid),
            "transparent" => Ok(BackgroundMode::Transparent),
            other => Err(format!(
                "unknown background '{}' (expected solid or transparent)",
                other
            )),
        }
    }
}

/// Background handling for a whole batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    /// Live capture against a solid color
    Solid(Rgba<u8>),
    /// Live capture with a transparent background
    Transparent,
    /// Preview recolor: replace the preview's background color
    Recolor(ColorKey),
}

/// What to do with the rest of the batch when one job fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Log the failed job and continue with the next one
    #[default]
    #[serde(rename = "skip")]
    SkipJob,
    /// Stop at the first failed job
    #[serde(rename = "abort")]
    AbortBatch,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(FailurePolicy::SkipJob),
            "abort" => Ok(FailurePolicy::AbortBatch),
            other => Err(format!("unknown policy '{}' (expected skip or abort)", other)),
        }
    }
}

/// Validated output specification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconSpec {
    size: Dimensions,
    format: IconFormat,
    quality: EncodingQuality,
    supersample: u32,
    background: Background,
}

impl IconSpec {
    /// Build a spec with high JPEG quality and no supersampling
    pub fn new(
        size: Dimensions,
        format: IconFormat,
        background: Background,
    ) -> Result<Self, ConfigError> {
        let spec = Self {
            size,
            format,
            quality: EncodingQuality::default(),
            supersample: 1,
            background,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn with_quality(mut self, quality: EncodingQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_supersample(mut self, supersample: u32) -> Result<Self, ConfigError> {
        self.supersample = supersample;
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.format == IconFormat::Jpeg && self.background == Background::Transparent {
            return Err(ConfigError::TransparentJpeg);
        }
        if self.size.is_empty() {
            return Err(ConfigError::ZeroIconSize {
                width: self.size.width,
                height: self.size.height,
            });
        }
        if self.supersample == 0 {
            return Err(ConfigError::ZeroSupersample);
        }
        if let Background::Recolor(key) = self.background
            && !self.format.supports_alpha()
            && key.replacement[3] != u8::MAX
        {
            warn!(
                replacement = ?key.replacement,
                "Replacement color is translucent but JPEG drops alpha"
            );
        }
        Ok(())
    }

    /// Reject icons larger than what a host of `native` resolution can capture
    ///
    /// The supersampled capture itself must stay within [`MAX_CAPTURE_DIMENSION`]
    /// on both axes.
    pub fn check_capture_resolution(&self, native: Dimensions) -> Result<(), ConfigError> {
        let limit = Dimensions::new(MAX_CAPTURE_DIMENSION, MAX_CAPTURE_DIMENSION);
        let capture = native
            .checked_scaled(self.supersample)
            .filter(|capture| capture.fits_within(limit))
            .ok_or(ConfigError::CaptureTooLarge {
                native,
                supersample: self.supersample,
            })?;
        if !self.size.fits_within(capture) {
            return Err(ConfigError::IconExceedsCapture {
                icon: self.size,
                capture,
            });
        }
        Ok(())
    }

    pub fn size(&self) -> Dimensions {
        self.size
    }

    pub fn format(&self) -> IconFormat {
        self.format
    }

    pub fn quality(&self) -> EncodingQuality {
        self.quality
    }

    pub fn supersample(&self) -> u32 {
        self.supersample
    }

    pub fn background(&self) -> Background {
        self.background
    }

    pub fn encoder(&self) -> IconEncoder {
        IconEncoder::new(self.format, self.quality)
    }
}

/// One unit of work: an object to turn into one icon file
#[derive(Debug, Clone, PartialEq)]
pub struct IconJob {
    /// Identifier used in the output file name
    pub id: String,
    pub object: ObjectRef,
    /// Extra distance along the depth axis for live capture
    pub offset: f32,
}

impl IconJob {
    pub fn new(id: impl Into<String>, object: ObjectRef) -> Self {
        Self {
            id: id.into(),
            object,
            offset: 0.0,
        }
    }

    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: Dimensions = Dimensions::new(256, 256);

    #[test]
    fn test_transparent_jpeg_rejected() {
        let result = IconSpec::new(SIZE, IconFormat::Jpeg, Background::Transparent);
        assert_eq!(result.unwrap_err(), ConfigError::TransparentJpeg);
    }

    #[test]
    fn test_transparent_png_and_tga_allowed() {
        assert!(IconSpec::new(SIZE, IconFormat::Png, Background::Transparent).is_ok());
        assert!(IconSpec::new(SIZE, IconFormat::Tga, Background::Transparent).is_ok());
    }

    #[test]
    fn test_solid_jpeg_allowed() {
        let spec = IconSpec::new(SIZE, IconFormat::Jpeg, Background::Solid(Rgba([1, 2, 3, 255])));
        assert!(spec.is_ok());
    }

    #[test]
    fn test_zero_sizes_rejected() {
        let background = Background::Solid(Rgba([0, 0, 0, 255]));
        assert!(matches!(
            IconSpec::new(Dimensions::new(0, 4), IconFormat::Png, background),
            Err(ConfigError::ZeroIconSize { .. })
        ));

        let spec = IconSpec::new(SIZE, IconFormat::Png, background).unwrap();
        assert_eq!(
            spec.with_supersample(0).unwrap_err(),
            ConfigError::ZeroSupersample
        );
    }

    #[test]
    fn test_capture_resolution_includes_supersample() {
        let spec = IconSpec::new(SIZE, IconFormat::Png, Background::Transparent)
            .unwrap()
            .with_supersample(2)
            .unwrap();

        assert!(spec.check_capture_resolution(Dimensions::new(128, 128)).is_ok());
        assert_eq!(
            spec.check_capture_resolution(Dimensions::new(128, 100)),
            Err(ConfigError::IconExceedsCapture {
                icon: SIZE,
                capture: Dimensions::new(256, 200),
            })
        );
    }

    #[test]
    fn test_capture_limit() {
        let spec = IconSpec::new(SIZE, IconFormat::Png, Background::Transparent).unwrap();
        let native = Dimensions::new(1024, 512);

        let at_limit = spec.with_supersample(MAX_CAPTURE_DIMENSION / 1024).unwrap();
        assert!(at_limit.check_capture_resolution(native).is_ok());

        for factor in [MAX_CAPTURE_DIMENSION / 1024 + 1, u32::MAX] {
            let spec = spec.with_supersample(factor).unwrap();
            assert_eq!(
                spec.check_capture_resolution(native),
                Err(ConfigError::CaptureTooLarge {
                    native,
                    supersample: factor,
                })
            );
        }
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("skip".parse::<FailurePolicy>(), Ok(FailurePolicy::SkipJob));
        assert_eq!("Abort".parse::<FailurePolicy>(), Ok(FailurePolicy::AbortBatch));
        assert!("retry".parse::<FailurePolicy>().is_err());
    }
}
