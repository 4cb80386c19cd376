// SPDX-License-Identifier: MPL-2.0

//! Icon Capture - turn 3D objects and preview thumbnails into icon files
//!
//! Two capture strategies share one encode and write stage: live capture
//! renders each object on a host and crops the frame, preview recolor swaps
//! the background of an existing thumbnail.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Render host traits and the software host
//! - [`pipelines`]: Capture strategies, image transforms and the batch orchestrator
//! - [`config`]: Batch configuration files
//! - [`storage`]: Output directory and atomic file writes
//!
//! # Example
//!
//! ```ignore
//! let config = BatchConfig::load(Path::new("icons.toml"))?;
//! let spec = config.icon_spec(PipelineKind::Live)?;
//! let mut live = LiveCapture::new(SoftwareHost::new(resolution), &spec, config.anchor()?)?;
//! let output = OutputTarget::new(config.output_dir(), config.file_name(PipelineKind::Live));
//! let report = IconPipeline::new(spec, output).run(&mut live, &config.jobs()?).await?;
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod storage;

// Re-export commonly used types
pub use backends::host::{CaptureSurface, Dimensions, SoftwareHost};
pub use config::{BatchConfig, PipelineKind};
pub use errors::{AppError, AppResult};
pub use pipelines::icon::{
    BatchReport, IconFormat, IconJob, IconPipeline, IconSpec, LiveCapture, OutputTarget,
    PreviewRecolor,
};
