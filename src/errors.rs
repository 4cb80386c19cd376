// SPDX-License-Identifier: MPL-2.0

//! Error types for icon capture

use crate::backends::host::Dimensions;
use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main error type
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Batch configuration rejected before any capture work
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// A job could not produce a surface
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),
    /// A surface could not be turned into bytes
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),
    /// Storage/filesystem errors
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Configuration errors, all detected before the first job starts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// JPEG has no alpha channel
    #[error("Transparent JPEG is not possible")]
    TransparentJpeg,
    /// Icon width or height is zero
    #[error("Icon size must be non-zero, got {width}x{height}")]
    ZeroIconSize { width: u32, height: u32 },
    /// Supersample factor of zero
    #[error("Supersample factor must be at least 1")]
    ZeroSupersample,
    /// Icon does not fit into the captured frame
    #[error("Icon size {icon} exceeds capture resolution {capture}")]
    IconExceedsCapture {
        icon: Dimensions,
        capture: Dimensions,
    },
    /// Supersampled capture overflows or exceeds the capture limit
    #[error("Supersample factor {supersample} on a {native} host exceeds the capture limit")]
    CaptureTooLarge { native: Dimensions, supersample: u32 },
    /// Anchor position or depth offset is not finite or out of range
    #[error("Invalid placement: {0}")]
    InvalidPlacement(String),
    /// Live capture needs a solid/transparent background, preview needs a color key
    #[error("Background setting does not fit the {pipeline} pipeline")]
    BackgroundMismatch { pipeline: &'static str },
    /// Batch without jobs
    #[error("Batch contains no jobs")]
    NoJobs,
    /// Two jobs would write the same file
    #[error("Duplicate job identifier: {0}")]
    DuplicateJob(String),
    /// Color string could not be parsed
    #[error("Invalid color: {0}")]
    InvalidColor(String),
    /// Configuration file could not be read
    #[error("Failed to read configuration: {0}")]
    Read(String),
    /// Configuration file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Per-job capture errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// Preview bitmap unavailable for an object
    #[error("No preview available for {job}")]
    MissingPreview { job: String },
    /// Crop target larger than the source surface
    #[error("Crop {target} is out of bounds for a {surface} surface")]
    OutOfBounds {
        surface: Dimensions,
        target: Dimensions,
    },
    /// The scene refused to spawn the object
    #[error("Failed to spawn {job}: {reason}")]
    SpawnFailed { job: String, reason: String },
    /// Pixel buffer does not match its dimensions
    #[error("Invalid surface: {0}")]
    InvalidSurface(String),
}

/// Encoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Zero-sized surfaces produce no bytes
    #[error("Cannot encode an empty surface")]
    EmptySurface,
    /// The codec rejected the surface
    #[error("{format} encoding failed: {reason}")]
    Unsupported { format: String, reason: String },
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl AppError {
    /// Whether this error stops the whole batch regardless of failure policy
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Config(_) | AppError::Storage(_))
    }
}
