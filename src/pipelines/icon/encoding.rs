// SPDX-License-Identifier: GPL-3.0-only

//! Icon encoding
//!
//! This module turns a finished surface into file bytes:
//! - JPEG (lossy, alpha dropped, quality presets)
//! - PNG (lossless, alpha kept)
//! - TGA (lossless, alpha kept)
//!
//! Encoding is CPU-bound, so the async entry point runs it on the blocking pool.

use crate::backends::host::{CaptureSurface, Dimensions};
use crate::constants::jpeg_quality;
use crate::errors::EncodeError;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

/// Supported icon formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconFormat {
    /// JPEG format (lossy, no alpha channel)
    #[serde(alias = "jpg")]
    Jpeg,
    /// PNG format (lossless)
    #[default]
    Png,
    /// Truevision TGA (lossless)
    Tga,
}

impl IconFormat {
    pub const ALL: [IconFormat; 3] = [IconFormat::Jpeg, IconFormat::Png, IconFormat::Tga];

    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            IconFormat::Jpeg => "jpg",
            IconFormat::Png => "png",
            IconFormat::Tga => "tga",
        }
    }

    /// Whether the encoded file keeps the alpha channel
    pub fn supports_alpha(&self) -> bool {
        !matches!(self, IconFormat::Jpeg)
    }

    fn to_image_format(self) -> ImageFormat {
        match self {
            IconFormat::Jpeg => ImageFormat::Jpeg,
            IconFormat::Png => ImageFormat::Png,
            IconFormat::Tga => ImageFormat::Tga,
        }
    }
}

impl std::fmt::Display for IconFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IconFormat::Jpeg => write!(f, "JPEG"),
            IconFormat::Png => write!(f, "PNG"),
            IconFormat::Tga => write!(f, "TGA"),
        }
    }
}

impl FromStr for IconFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(IconFormat::Jpeg),
            "png" => Ok(IconFormat::Png),
            "tga" => Ok(IconFormat::Tga),
            other => Err(format!("unknown format '{}' (expected jpeg, png or tga)", other)),
        }
    }
}

/// JPEG quality presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingQuality {
    /// Low quality (high compression)
    Low,
    /// Medium quality (balanced)
    Medium,
    /// High quality (low compression)
    #[default]
    High,
    /// Maximum quality (minimal compression)
    Maximum,
}

impl EncodingQuality {
    /// Get JPEG quality value (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            EncodingQuality::Low => jpeg_quality::LOW,
            EncodingQuality::Medium => jpeg_quality::MEDIUM,
            EncodingQuality::High => jpeg_quality::HIGH,
            EncodingQuality::Maximum => jpeg_quality::MAXIMUM,
        }
    }
}

/// Encoded icon bytes and where they go
#[derive(Debug)]
pub struct EncodedIcon {
    pub data: Vec<u8>,
    pub format: IconFormat,
    pub dimensions: Dimensions,
    pub destination: PathBuf,
}

/// Icon encoder
#[derive(Debug, Clone, Copy)]
pub struct IconEncoder {
    format: IconFormat,
    quality: EncodingQuality,
}

impl IconEncoder {
    pub fn new(format: IconFormat, quality: EncodingQuality) -> Self {
        Self { format, quality }
    }

    pub fn format(&self) -> IconFormat {
        self.format
    }

    /// Encode a surface. Consumes it; the surface is never reused.
    pub fn encode(
        &self,
        surface: CaptureSurface,
        destination: PathBuf,
    ) -> Result<EncodedIcon, EncodeError> {
        let dimensions = surface.dimensions();
        if dimensions.is_empty() {
            return Err(EncodeError::EmptySurface);
        }

        let data = match self.format {
            IconFormat::Jpeg => Self::encode_jpeg(surface, self.quality)?,
            IconFormat::Png | IconFormat::Tga => Self::encode_lossless(surface, self.format)?,
        };

        debug!(size = data.len(), format = %self.format, "Encoding complete");

        Ok(EncodedIcon {
            data,
            format: self.format,
            dimensions,
            destination,
        })
    }

    /// Encode on the blocking pool
    pub async fn encode_async(
        &self,
        surface: CaptureSurface,
        destination: PathBuf,
    ) -> Result<EncodedIcon, EncodeError> {
        info!(
            width = surface.width(),
            height = surface.height(),
            format = %self.format,
            "Starting encoding"
        );

        let encoder = *self;
        tokio::task::spawn_blocking(move || encoder.encode(surface, destination))
            .await
            .map_err(|e| EncodeError::Unsupported {
                format: self.format.to_string(),
                reason: format!("encoding task error: {}", e),
            })?
    }

    /// JPEG carries no alpha: the channel is dropped, not blended
    fn encode_jpeg(
        surface: CaptureSurface,
        quality: EncodingQuality,
    ) -> Result<Vec<u8>, EncodeError> {
        let rgb = DynamicImage::ImageRgba8(surface.into_image()).to_rgb8();
        let mut buffer = Vec::new();
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
            &mut buffer,
            quality.jpeg_quality(),
        );

        encoder
            .encode(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| EncodeError::Unsupported {
                format: IconFormat::Jpeg.to_string(),
                reason: e.to_string(),
            })?;

        Ok(buffer)
    }

    fn encode_lossless(surface: CaptureSurface, format: IconFormat) -> Result<Vec<u8>, EncodeError> {
        let mut buffer = Vec::new();

        surface
            .image()
            .write_to(&mut Cursor::new(&mut buffer), format.to_image_format())
            .map_err(|e| EncodeError::Unsupported {
                format: format.to_string(),
                reason: e.to_string(),
            })?;

        Ok(buffer)
    }
}
