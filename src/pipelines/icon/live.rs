// SPDX-License-Identifier: GPL-3.0-only

//! Live capture strategy: spawn, capture, reset, crop

use super::capture::FrameProtocol;
use super::crop::center_crop;
use super::spec::{IconJob, IconSpec};
use super::{CaptureStrategy, JobState, enter_state};
use crate::backends::host::{CaptureHost, CaptureSurface, Dimensions, Placement, RenderTargetState};
use crate::errors::{CaptureError, ConfigError};

/// Renders each job's object on a host and crops the frame to icon size
pub struct LiveCapture<H> {
    host: H,
    protocol: FrameProtocol,
    icon_size: Dimensions,
    anchor: Placement,
    /// Render-target state carried from one capture to the next
    state: Option<RenderTargetState>,
}

impl<H: CaptureHost> LiveCapture<H> {
    /// Check `spec` against the host before any object is spawned
    pub fn new(host: H, spec: &IconSpec, anchor: Placement) -> Result<Self, ConfigError> {
        let protocol = FrameProtocol::for_background(spec.background(), spec.supersample())
            .ok_or(ConfigError::BackgroundMismatch { pipeline: "live" })?;
        spec.check_capture_resolution(host.resolution())?;

        Ok(Self {
            host,
            protocol,
            icon_size: spec.size(),
            anchor,
            state: None,
        })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }
}

impl<H: CaptureHost> CaptureStrategy for LiveCapture<H> {
    fn name(&self) -> &'static str {
        "live"
    }

    async fn acquire(&mut self, job: &IconJob) -> Result<CaptureSurface, CaptureError> {
        let state = match self.state.take() {
            Some(state) => state,
            None => self.protocol.prepare(&mut self.host),
        };

        let placement = self.anchor.offset_depth(job.offset);
        let (frame, state) = self
            .protocol
            .capture(state, &job.object, placement, &mut self.host)
            .await?;
        self.state = Some(state);
        enter_state(&job.id, JobState::FrameCaptured);

        let icon = center_crop(&frame, self.icon_size)?;
        enter_state(&job.id, JobState::Cropped);
        Ok(icon)
    }
}
