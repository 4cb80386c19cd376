// SPDX-License-Identifier: GPL-3.0-only

//! Preview recolor strategy: copy a preview bitmap and swap its background

use super::keying::ColorKey;
use super::spec::{Background, IconJob, IconSpec};
use super::{CaptureStrategy, JobState, enter_state};
use crate::backends::host::{CaptureSurface, PreviewSource};
use crate::errors::{CaptureError, ConfigError};

/// Turns pre-rendered previews into icons by color keying their background
pub struct PreviewRecolor<P> {
    source: P,
    key: ColorKey,
}

impl<P: PreviewSource> PreviewRecolor<P> {
    pub fn new(source: P, spec: &IconSpec) -> Result<Self, ConfigError> {
        match spec.background() {
            Background::Recolor(key) => Ok(Self { source, key }),
            _ => Err(ConfigError::BackgroundMismatch { pipeline: "preview" }),
        }
    }
}

impl<P: PreviewSource> CaptureStrategy for PreviewRecolor<P> {
    fn name(&self) -> &'static str {
        "preview"
    }

    async fn acquire(&mut self, job: &IconJob) -> Result<CaptureSurface, CaptureError> {
        let preview = self
            .source
            .preview_bitmap(&job.object)
            .ok_or_else(|| CaptureError::MissingPreview {
                job: job.id.clone(),
            })?;
        enter_state(&job.id, JobState::PreviewAcquired);

        // Previews belong to the source; recolor a private copy
        let mut surface = preview.copy_pixels();
        drop(preview);

        self.key.apply(&mut surface);
        enter_state(&job.id, JobState::Recolored);
        Ok(surface)
    }
}
