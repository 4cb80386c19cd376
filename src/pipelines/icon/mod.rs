// SPDX-License-Identifier: GPL-3.0-only

//! Icon capture pipeline
//!
//! Both strategies end in the same encode and write stage:
//!
//! ```text
//! Live:    spawn → frame → reset → center crop ─┐
//!                                               ├─▶ encode → write
//! Preview: preview bitmap → copy → color key ───┘
//! ```
//!
//! Jobs run strictly one after another. A job is finished, file written or
//! failure recorded, before the next one starts.

pub mod capture;
pub mod crop;
pub mod encoding;
pub mod keying;
pub mod live;
pub mod preview;
pub mod spec;

pub use capture::{CaptureStep, FrameProtocol, PendingCapture};
pub use crop::{center_crop, crop_origin};
pub use encoding::{EncodedIcon, EncodingQuality, IconEncoder, IconFormat};
pub use keying::ColorKey;
pub use live::LiveCapture;
pub use preview::PreviewRecolor;
pub use spec::{Background, BackgroundMode, FailurePolicy, IconJob, IconSpec};

use crate::backends::host::CaptureSurface;
use crate::errors::{AppError, AppResult, CaptureError};
use crate::storage;
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};

/// Where a job is in its pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobState {
    Idle,
    ObjectSpawned,
    FrameCaptured,
    Cropped,
    PreviewAcquired,
    Recolored,
    Encoded,
    Written,
    Aborted,
}

pub(crate) fn enter_state(job: &str, state: JobState) {
    debug!(job = %job, state = ?state, "Job state");
}

/// One way of turning a job into a surface ready for encoding
///
/// [`LiveCapture`] returns the frame cropped to the icon size.
/// [`PreviewRecolor`] returns the recolored preview at the preview's own size.
pub trait CaptureStrategy {
    /// Short name used in logs and reports
    fn name(&self) -> &'static str;

    fn acquire(
        &mut self,
        job: &IconJob,
    ) -> impl Future<Output = Result<CaptureSurface, CaptureError>>;
}

/// Directory and base file name for a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub directory: PathBuf,
    pub base_name: String,
}

impl OutputTarget {
    pub fn new(directory: impl Into<PathBuf>, base_name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            base_name: base_name.into(),
        }
    }

    /// Destination of `job` encoded as `format`
    pub fn path_for(&self, job: &IconJob, format: IconFormat) -> PathBuf {
        self.directory
            .join(storage::icon_file_name(&self.base_name, &job.id, format))
    }
}

/// Result of one job
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    pub job: String,
    /// Last state reached: `Written` or `Aborted`
    pub state: JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of a batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub strategy: &'static str,
    /// RFC 3339 start time
    pub started_at: String,
    pub elapsed_ms: u64,
    pub outcomes: Vec<JobOutcome>,
    /// Jobs never attempted because the batch stopped early
    pub not_started: Vec<String>,
    pub aborted: bool,
}

impl BatchReport {
    /// Files written, in job order
    pub fn written(&self) -> Vec<&Path> {
        self.outcomes
            .iter()
            .filter_map(|o| o.path.as_deref())
            .collect()
    }

    /// Failed jobs with their error messages
    pub fn failed(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.error.as_deref().map(|e| (o.job.as_str(), e)))
            .collect()
    }

    pub fn is_success(&self) -> bool {
        !self.aborted && self.outcomes.iter().all(|o| o.state == JobState::Written)
    }
}

/// Batch orchestrator
///
/// Runs every job through a [`CaptureStrategy`], encodes the surface and
/// writes it. What happens after a failed job is decided by the
/// [`FailurePolicy`]; storage failures always stop the batch.
pub struct IconPipeline {
    spec: IconSpec,
    output: OutputTarget,
    policy: FailurePolicy,
}

impl IconPipeline {
    pub fn new(spec: IconSpec, output: OutputTarget) -> Self {
        Self {
            spec,
            output,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Process `jobs` in order
    ///
    /// Returns `Err` only when the output directory cannot be created; job
    /// failures are recorded in the report.
    pub async fn run<S: CaptureStrategy>(
        &self,
        strategy: &mut S,
        jobs: &[IconJob],
    ) -> AppResult<BatchReport> {
        let started_at = chrono::Local::now().to_rfc3339();
        let start = Instant::now();

        storage::ensure_directory(&self.output.directory).await?;

        info!(
            strategy = strategy.name(),
            jobs = jobs.len(),
            format = %self.spec.format(),
            size = %self.spec.size(),
            directory = %self.output.directory.display(),
            "Starting icon batch"
        );

        let mut outcomes = Vec::with_capacity(jobs.len());
        let mut aborted = false;

        for job in jobs {
            enter_state(&job.id, JobState::Idle);

            match self.process(strategy, job).await {
                Ok(path) => {
                    enter_state(&job.id, JobState::Written);
                    info!(job = %job.id, path = %path.display(), "Icon written");
                    outcomes.push(JobOutcome {
                        job: job.id.clone(),
                        state: JobState::Written,
                        path: Some(path),
                        error: None,
                    });
                }
                Err(e) => {
                    enter_state(&job.id, JobState::Aborted);
                    error!(job = %job.id, error = %e, "Icon job failed");
                    outcomes.push(JobOutcome {
                        job: job.id.clone(),
                        state: JobState::Aborted,
                        path: None,
                        error: Some(e.to_string()),
                    });

                    if self.policy == FailurePolicy::AbortBatch || e.is_fatal() {
                        aborted = true;
                        break;
                    }
                }
            }
        }

        let not_started = jobs
            .iter()
            .skip(outcomes.len())
            .map(|job| job.id.clone())
            .collect();

        let report = BatchReport {
            strategy: strategy.name(),
            started_at,
            elapsed_ms: start.elapsed().as_millis() as u64,
            outcomes,
            not_started,
            aborted,
        };

        info!(
            written = report.written().len(),
            failed = report.failed().len(),
            aborted = report.aborted,
            elapsed_ms = report.elapsed_ms,
            "Icon batch finished"
        );

        Ok(report)
    }

    async fn process<S: CaptureStrategy>(
        &self,
        strategy: &mut S,
        job: &IconJob,
    ) -> Result<PathBuf, AppError> {
        let surface = strategy.acquire(job).await?;

        let destination = self.output.path_for(job, self.spec.format());
        let encoded = self
            .spec
            .encoder()
            .encode_async(surface, destination)
            .await?;
        enter_state(&job.id, JobState::Encoded);

        storage::write_file(&encoded.destination, &encoded.data).await?;
        Ok(encoded.destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::host::{Dimensions, ObjectRef};
    use image::Rgba;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    /// Serves solid surfaces, failing the jobs named in `fail`
    struct ScriptedStrategy {
        size: Dimensions,
        fail: Vec<&'static str>,
        calls: usize,
    }

    impl CaptureStrategy for ScriptedStrategy {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn acquire(&mut self, job: &IconJob) -> Result<CaptureSurface, CaptureError> {
            self.calls += 1;
            if self.fail.contains(&job.id.as_str()) {
                return Err(CaptureError::MissingPreview {
                    job: job.id.clone(),
                });
            }
            Ok(CaptureSurface::filled(self.size.width, self.size.height, RED))
        }
    }

    fn jobs() -> Vec<IconJob> {
        ["a", "b", "c"]
            .iter()
            .map(|id| IconJob::new(*id, ObjectRef::new(*id, format!("{}.png", id))))
            .collect()
    }

    fn pipeline(dir: &Path) -> IconPipeline {
        let spec = IconSpec::new(
            Dimensions::new(4, 4),
            IconFormat::Png,
            Background::Solid(Rgba([0, 0, 0, 255])),
        )
        .unwrap();
        IconPipeline::new(spec, OutputTarget::new(dir, "Icon"))
    }

    #[test]
    fn test_output_path() {
        let target = OutputTarget::new("/out", "Advanced Icon");
        let job = IconJob::new("Sword", ObjectRef::new("Sword", "sword.png"));
        assert_eq!(
            target.path_for(&job, IconFormat::Tga),
            PathBuf::from("/out/Advanced Icon Sword.tga")
        );
    }

    #[tokio::test]
    async fn test_skip_continues_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut strategy = ScriptedStrategy {
            size: Dimensions::new(4, 4),
            fail: vec!["b"],
            calls: 0,
        };

        let report = pipeline(dir.path())
            .run(&mut strategy, &jobs())
            .await
            .unwrap();

        assert_eq!(strategy.calls, 3);
        assert_eq!(report.written().len(), 2);
        assert_eq!(
            report.failed(),
            vec![("b", "Capture error: No preview available for b")]
        );
        assert!(!report.aborted);
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn test_abort_stops_batch() {
        let dir = tempfile::tempdir().unwrap();
        let mut strategy = ScriptedStrategy {
            size: Dimensions::new(4, 4),
            fail: vec!["b"],
            calls: 0,
        };

        let report = pipeline(dir.path())
            .with_policy(FailurePolicy::AbortBatch)
            .run(&mut strategy, &jobs())
            .await
            .unwrap();

        assert_eq!(strategy.calls, 2);
        assert_eq!(report.written().len(), 1);
        assert_eq!(report.not_started, vec!["c".to_string()]);
        assert!(report.aborted);
    }

    #[tokio::test]
    async fn test_encode_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut strategy = ScriptedStrategy {
            size: Dimensions::new(0, 0),
            fail: vec![],
            calls: 0,
        };

        let report = pipeline(dir.path())
            .run(&mut strategy, &jobs()[..1])
            .await
            .unwrap();

        assert_eq!(report.outcomes[0].state, JobState::Aborted);
        assert!(storage::list_icons(dir.path()).await.unwrap().is_empty());
    }
}
