// SPDX-License-Identifier: GPL-3.0-only

//! Live frame capture protocol
//!
//! Capturing one object takes two presented frames:
//!
//! ```text
//! begin_capture ──▶ spawn object
//!      │
//!  frame N presented (object composited)
//!      │
//! resume ──▶ read back frame, destroy object, full color clear
//!      │
//!  frame N+1 presented (clear visible)
//!      │
//! resume ──▶ restore resting clear state, surface complete
//! ```
//!
//! A depth-only clear alone keeps the previous object's pixels in the color
//! buffer, so the color clear has to be presented before the next object is
//! spawned.
//!
//! The protocol is a plain step function: [`FrameProtocol::begin_capture`]
//! returns a [`PendingCapture`], and every presented frame is fed back through
//! [`FrameProtocol::resume`] until it yields [`CaptureStep::Complete`].
//! [`FrameProtocol::capture`] is the scheduler loop for async hosts.

use super::spec::Background;
use super::{JobState, enter_state};
use crate::backends::host::{
    CaptureHost, CaptureSurface, ClearMode, ObjectRef, Placement, PresentedFrame,
    RenderTargetState, SpawnHandle,
};
use crate::errors::CaptureError;
use image::Rgba;
use tracing::{debug, trace};

const TRANSPARENT_BLACK: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Where a pending capture is in the protocol
#[derive(Debug)]
enum Phase {
    /// Object spawned, waiting for the frame that composites it
    AwaitComposite { handle: SpawnHandle },
    /// Frame read back, waiting for the color clear to be presented
    AwaitClear { surface: CaptureSurface },
}

/// A capture suspended until the host presents another frame
#[derive(Debug)]
#[must_use = "a pending capture must be resumed with presented frames"]
pub struct PendingCapture {
    object: String,
    state: RenderTargetState,
    phase: Phase,
    /// Last frame presented before this phase began; only later frames count
    requested_after: u64,
}

impl PendingCapture {
    pub fn state(&self) -> &RenderTargetState {
        &self.state
    }

    /// Whether the frame has been read back and only cleanup remains
    pub fn is_cleaning_up(&self) -> bool {
        matches!(self.phase, Phase::AwaitClear { .. })
    }

    pub fn requested_after(&self) -> u64 {
        self.requested_after
    }
}

/// Result of feeding one presented frame to [`FrameProtocol::resume`]
#[derive(Debug)]
pub enum CaptureStep {
    /// Another frame is needed
    Pending(PendingCapture),
    /// Frame captured and render target clean again
    Complete {
        surface: CaptureSurface,
        state: RenderTargetState,
    },
}

/// Frame acquisition and reset for live capture
#[derive(Debug, Clone, Copy)]
pub struct FrameProtocol {
    resting: RenderTargetState,
    reset_color: Rgba<u8>,
    supersample: u32,
}

impl FrameProtocol {
    /// Protocol for a live background; `None` for preview recolor specs
    pub fn for_background(background: Background, supersample: u32) -> Option<Self> {
        let (resting, reset_color) = match background {
            Background::Solid(color) => (RenderTargetState::new(ClearMode::Color, color), color),
            Background::Transparent => (
                RenderTargetState::new(ClearMode::DepthOnly, TRANSPARENT_BLACK),
                TRANSPARENT_BLACK,
            ),
            Background::Recolor(_) => return None,
        };

        Some(Self {
            resting,
            reset_color,
            supersample: supersample.max(1),
        })
    }

    /// Clear state the render target sits in between captures
    pub fn resting_state(&self) -> RenderTargetState {
        self.resting
    }

    /// Color-clear the render target before the first capture
    ///
    /// The target may hold anything from before the batch, so the first
    /// composite always starts from a full clear to the reset color.
    pub fn prepare<H: CaptureHost>(&self, host: &mut H) -> RenderTargetState {
        let state = RenderTargetState::new(ClearMode::Color, self.reset_color);
        host.apply_state(&state);
        state
    }

    /// Spawn the object and suspend until a frame composites it
    pub fn begin_capture<H: CaptureHost>(
        &self,
        mut state: RenderTargetState,
        object: &ObjectRef,
        placement: Placement,
        host: &mut H,
    ) -> Result<PendingCapture, CaptureError> {
        if let Some(stale) = state.spawned.take() {
            debug!(handle = stale.0, "Destroying object left over from an earlier capture");
            host.destroy(stale);
        }

        let handle = host.spawn(object, placement)?;
        state.spawned = Some(handle);
        trace!(object = %object.name, handle = handle.0, "Spawn handle");
        enter_state(&object.name, JobState::ObjectSpawned);

        Ok(PendingCapture {
            object: object.name.clone(),
            state,
            phase: Phase::AwaitComposite { handle },
            requested_after: host.frame_sequence(),
        })
    }

    /// Advance a pending capture with a presented frame
    ///
    /// Frames presented before the pending phase was entered are ignored and
    /// the capture stays pending.
    pub fn resume<H: CaptureHost>(
        &self,
        pending: PendingCapture,
        frame: PresentedFrame,
        host: &mut H,
    ) -> CaptureStep {
        if frame.sequence <= pending.requested_after {
            trace!(
                object = %pending.object,
                frame = frame.sequence,
                requested_after = pending.requested_after,
                "Ignoring frame presented before the request"
            );
            return CaptureStep::Pending(pending);
        }

        let PendingCapture {
            object,
            mut state,
            phase,
            ..
        } = pending;

        match phase {
            Phase::AwaitComposite { handle } => {
                let surface = host.capture_frame(self.supersample);
                debug!(
                    object = %object,
                    frame = frame.sequence,
                    width = surface.width(),
                    height = surface.height(),
                    "Frame captured"
                );

                host.destroy(handle);
                state.spawned = None;
                state.clear_mode = ClearMode::Color;
                state.clear_color = self.reset_color;
                host.apply_state(&state);

                CaptureStep::Pending(PendingCapture {
                    object,
                    state,
                    phase: Phase::AwaitClear { surface },
                    requested_after: frame.sequence,
                })
            }
            Phase::AwaitClear { surface } => {
                let state = self.resting;
                host.apply_state(&state);
                debug!(object = %object, frame = frame.sequence, "Render target reset");

                CaptureStep::Complete { surface, state }
            }
        }
    }

    /// Drive one capture to completion, suspending on the host's frame boundaries
    pub async fn capture<H: CaptureHost>(
        &self,
        state: RenderTargetState,
        object: &ObjectRef,
        placement: Placement,
        host: &mut H,
    ) -> Result<(CaptureSurface, RenderTargetState), CaptureError> {
        let mut pending = self.begin_capture(state, object, placement, host)?;

        loop {
            let frame = host.await_frame_end().await;
            match self.resume(pending, frame, host) {
                CaptureStep::Pending(next) => pending = next,
                CaptureStep::Complete { surface, state } => return Ok((surface, state)),
            }
        }
    }
}
