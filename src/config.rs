// SPDX-License-Identifier: GPL-3.0-only

//! Batch configuration
//!
//! A batch is described by a TOML file:
//!
//! ```toml
//! format = "png"
//! icon_size = [256, 256]
//! background = "transparent"
//!
//! [anchor]
//! position = [0.0, 0.0, 10.0]
//!
//! [[jobs]]
//! object = "props/sword.png"
//! name = "Sword"
//! ```
//!
//! Every optional key has a serde default. All validation happens here, before
//! any capture work starts.

use crate::backends::host::{Dimensions, ObjectRef, Placement, Rotation};
use crate::constants::{
    DEFAULT_BACKGROUND, DEFAULT_FOLDER_NAME, DEFAULT_ICON_SIZE, DEFAULT_LIVE_FILE_NAME,
    DEFAULT_PREVIEW_FILE_NAME, MAX_PLACEMENT_COORDINATE, PREVIEW_BACKGROUND,
};
use crate::errors::ConfigError;
use crate::pipelines::icon::{
    Background, BackgroundMode, ColorKey, EncodingQuality, FailurePolicy, IconFormat, IconJob,
    IconSpec,
};
use crate::storage;
use image::Rgba;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Which capture strategy a batch runs with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    Live,
    Preview,
}

impl PipelineKind {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineKind::Live => "live",
            PipelineKind::Preview => "preview",
        }
    }
}

/// An RGBA color written as `[r, g, b, a]`, `[r, g, b]` or `"#rrggbb[aa]"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorValue(pub Rgba<u8>);

impl FromStr for ColorValue {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidColor(s.to_string());
        let hex = s.trim().trim_start_matches('#');
        if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
            return Err(invalid());
        }

        let mut channels = [u8::MAX; 4];
        for (i, channel) in channels.iter_mut().enumerate().take(hex.len() / 2) {
            *channel = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(ColorValue(Rgba(channels)))
    }
}

impl TryFrom<Vec<u8>> for ColorValue {
    type Error = ConfigError;

    fn try_from(channels: Vec<u8>) -> Result<Self, Self::Error> {
        match channels.as_slice() {
            &[r, g, b] => Ok(ColorValue(Rgba([r, g, b, u8::MAX]))),
            &[r, g, b, a] => Ok(ColorValue(Rgba([r, g, b, a]))),
            _ => Err(ConfigError::InvalidColor(format!("{:?}", channels))),
        }
    }
}

impl Serialize for ColorValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ColorValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Channels(Vec<u8>),
            Hex(String),
        }

        let color = match Raw::deserialize(deserializer)? {
            Raw::Channels(channels) => ColorValue::try_from(channels),
            Raw::Hex(text) => text.parse(),
        };
        color.map_err(serde::de::Error::custom)
    }
}

/// Where objects spawn for live capture
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnchorConfig {
    /// World position of the spawn point
    #[serde(default)]
    pub position: [f32; 3],
    /// Rotation in degrees, snapped to quarter turns
    #[serde(default)]
    pub rotation: i32,
}

/// One `[[jobs]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Object file, relative to the assets directory
    pub object: PathBuf,
    /// Identifier in the output file name; defaults to the object's file stem
    #[serde(default)]
    pub name: Option<String>,
    /// Extra distance from the anchor along the depth axis
    #[serde(default)]
    pub offset: f32,
}

/// Command-line overrides applied on top of the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub format: Option<IconFormat>,
    pub icon_size: Option<Dimensions>,
    pub supersample: Option<u32>,
    pub background: Option<BackgroundMode>,
    pub failure_policy: Option<FailurePolicy>,
}

/// A batch configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Output folder name, created beside the assets directory
    #[serde(default = "default_folder_name")]
    pub folder_name: String,

    /// Base file name; defaults depend on the pipeline
    #[serde(default)]
    pub file_name: Option<String>,

    #[serde(default)]
    pub format: IconFormat,

    /// JPEG quality preset
    #[serde(default)]
    pub quality: EncodingQuality,

    #[serde(default = "default_icon_size")]
    pub icon_size: [u32; 2],

    #[serde(default = "default_supersample")]
    pub supersample: u32,

    /// Live capture background mode
    #[serde(default)]
    pub background: BackgroundMode,

    /// Live capture background color in solid mode
    #[serde(default = "default_background_color")]
    pub background_color: ColorValue,

    /// Background color of the preview bitmaps
    #[serde(default = "default_preview_key_color")]
    pub preview_key_color: ColorValue,

    /// Color that replaces the preview background
    #[serde(default = "default_replacement_color")]
    pub replacement_color: ColorValue,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Directory holding the objects; defaults to the config file's directory
    #[serde(default)]
    pub assets_dir: Option<PathBuf>,

    #[serde(default)]
    pub anchor: AnchorConfig,

    #[serde(default)]
    pub jobs: Vec<JobConfig>,

    /// Directory relative paths are resolved against
    #[serde(skip)]
    base_dir: PathBuf,
}

fn default_folder_name() -> String {
    DEFAULT_FOLDER_NAME.to_string()
}

fn default_icon_size() -> [u32; 2] {
    [DEFAULT_ICON_SIZE.width, DEFAULT_ICON_SIZE.height]
}

fn default_supersample() -> u32 {
    1
}

fn default_background_color() -> ColorValue {
    ColorValue(DEFAULT_BACKGROUND)
}

fn default_preview_key_color() -> ColorValue {
    ColorValue(PREVIEW_BACKGROUND)
}

fn default_replacement_color() -> ColorValue {
    ColorValue(Rgba([0, 0, 0, 0]))
}

impl BatchConfig {
    /// Load a batch from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;

        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let config = Self::parse(&content, base_dir)?;

        info!(path = %path.display(), jobs = config.jobs.len(), "Loaded batch configuration");
        Ok(config)
    }

    /// Parse TOML, resolving relative paths against `base_dir`
    pub fn parse(content: &str, base_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let mut config: BatchConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.base_dir = base_dir.into();
        Ok(config)
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(format) = overrides.format {
            self.format = format;
        }
        if let Some(size) = overrides.icon_size {
            self.icon_size = [size.width, size.height];
        }
        if let Some(supersample) = overrides.supersample {
            self.supersample = supersample;
        }
        if let Some(background) = overrides.background {
            self.background = background;
        }
        if let Some(policy) = overrides.failure_policy {
            self.failure_policy = policy;
        }
    }

    pub fn icon_size(&self) -> Dimensions {
        Dimensions::new(self.icon_size[0], self.icon_size[1])
    }

    /// Background for `kind`
    pub fn background_for(&self, kind: PipelineKind) -> Background {
        match kind {
            PipelineKind::Live => match self.background {
                BackgroundMode::Solid => Background::Solid(self.background_color.0),
                BackgroundMode::Transparent => Background::Transparent,
            },
            PipelineKind::Preview => Background::Recolor(ColorKey::new(
                self.preview_key_color.0,
                self.replacement_color.0,
            )),
        }
    }

    /// Validated spec shared by every job of the batch
    pub fn icon_spec(&self, kind: PipelineKind) -> Result<IconSpec, ConfigError> {
        let spec = IconSpec::new(self.icon_size(), self.format, self.background_for(kind))?
            .with_quality(self.quality)
            .with_supersample(self.supersample)?;
        debug!(pipeline = kind.name(), spec = ?spec, "Icon spec validated");
        Ok(spec)
    }

    /// Check every setting `kind` reads, short of the host resolution
    pub fn validate(&self, kind: PipelineKind) -> Result<IconSpec, ConfigError> {
        let spec = self.icon_spec(kind)?;
        if kind == PipelineKind::Live {
            self.anchor()?;
        }
        Ok(spec)
    }

    /// Assets directory, absolute or relative to the config file
    pub fn assets_dir(&self) -> PathBuf {
        match &self.assets_dir {
            Some(dir) => self.base_dir.join(dir),
            None => self.base_dir.clone(),
        }
    }

    /// Jobs in file order with unique identifiers
    pub fn jobs(&self) -> Result<Vec<IconJob>, ConfigError> {
        if self.jobs.is_empty() {
            return Err(ConfigError::NoJobs);
        }

        let assets_dir = self.assets_dir();
        let mut seen = HashSet::new();
        let mut jobs = Vec::with_capacity(self.jobs.len());

        for entry in &self.jobs {
            let id = match &entry.name {
                Some(name) => name.clone(),
                None => entry
                    .object
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .ok_or_else(|| {
                        ConfigError::Parse(format!(
                            "job object '{}' has no file name",
                            entry.object.display()
                        ))
                    })?,
            };

            if !seen.insert(id.clone()) {
                return Err(ConfigError::DuplicateJob(id));
            }

            check_coordinate(&format!("offset of job '{}'", id), entry.offset)?;

            let object = ObjectRef::new(id.clone(), assets_dir.join(&entry.object));
            jobs.push(IconJob::new(id, object).with_offset(entry.offset));
        }

        Ok(jobs)
    }

    /// Output directory: `folder_name` beside the assets directory
    pub fn output_dir(&self) -> PathBuf {
        storage::resolve_output_dir(&self.assets_dir(), &self.folder_name)
    }

    /// Base file name for `kind`
    pub fn file_name(&self, kind: PipelineKind) -> String {
        match (&self.file_name, kind) {
            (Some(name), _) => name.clone(),
            (None, PipelineKind::Live) => DEFAULT_LIVE_FILE_NAME.to_string(),
            (None, PipelineKind::Preview) => DEFAULT_PREVIEW_FILE_NAME.to_string(),
        }
    }

    /// Spawn placement for live capture, before per-job offsets
    pub fn anchor(&self) -> Result<Placement, ConfigError> {
        for (axis, value) in ["x", "y", "z"].into_iter().zip(self.anchor.position) {
            check_coordinate(&format!("anchor {}", axis), value)?;
        }
        Ok(Placement::new(
            self.anchor.position,
            Rotation::from_degrees_int(self.anchor.rotation),
        ))
    }
}

fn check_coordinate(what: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value.abs() <= MAX_PLACEMENT_COORDINATE {
        return Ok(());
    }
    Err(ConfigError::InvalidPlacement(format!(
        "{} is {}, expected a finite value between -{max} and {max}",
        what,
        value,
        max = MAX_PLACEMENT_COORDINATE
    )))
}
