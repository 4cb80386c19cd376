// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for icon generation
//!
//! This module provides command-line functionality for:
//! - Running the live capture pipeline on the software host
//! - Running the preview recolor pipeline on preview files
//! - Validating a batch configuration

use icon_capture::backends::host::{Dimensions, FilePreviewSource, SoftwareHost};
use icon_capture::config::{BatchConfig, Overrides, PipelineKind};
use icon_capture::errors::AppResult;
use icon_capture::pipelines::icon::{
    BatchReport, CaptureStrategy, IconJob, IconPipeline, IconSpec, LiveCapture, OutputTarget,
    PreviewRecolor,
};
use icon_capture::storage;
use serde::Serialize;
use std::path::Path;

/// Run the live capture pipeline
pub fn run_live(
    config_path: &Path,
    resolution: Dimensions,
    overrides: Overrides,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load(config_path, &overrides)?;
    let spec = config.icon_spec(PipelineKind::Live)?;
    let jobs = config.jobs()?;
    let anchor = config.anchor()?;

    let host = SoftwareHost::new(resolution);
    let mut strategy = LiveCapture::new(host, &spec, anchor)?;
    println!(
        "Live capture: {} jobs at {} ({}x supersample)",
        jobs.len(),
        resolution,
        spec.supersample()
    );

    let report = run_batch(&config, PipelineKind::Live, spec, &mut strategy, &jobs)?;
    finish(&report, json)
}

/// Run the preview recolor pipeline
///
/// Each job's object file is read as its preview bitmap.
pub fn run_preview(
    config_path: &Path,
    overrides: Overrides,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load(config_path, &overrides)?;
    let spec = config.icon_spec(PipelineKind::Preview)?;
    let jobs = config.jobs()?;

    let mut strategy = PreviewRecolor::new(FilePreviewSource::new(), &spec)?;
    println!("Preview recolor: {} jobs", jobs.len());

    let report = run_batch(&config, PipelineKind::Preview, spec, &mut strategy, &jobs)?;
    finish(&report, json)
}

#[derive(Serialize)]
struct CheckSummary {
    format: String,
    icon_size: String,
    supersample: u32,
    output_dir: String,
    pipelines: Vec<CheckedPipeline>,
    jobs: Vec<CheckedJob>,
    existing_icons: usize,
}

#[derive(Serialize)]
struct CheckedPipeline {
    pipeline: &'static str,
    /// `None` if the batch can run on this pipeline
    error: Option<String>,
}

#[derive(Serialize)]
struct CheckedJob {
    id: String,
    object: String,
    offset: f32,
}

/// Validate a configuration for each pipeline and list its jobs
///
/// Fails only when neither pipeline accepts the configuration.
pub fn check(config_path: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = load(config_path, &Overrides::default())?;
    let live = config.validate(PipelineKind::Live);
    let preview = config.validate(PipelineKind::Preview);
    if let (Err(e), Err(_)) = (&live, &preview) {
        return Err(e.clone().into());
    }
    let jobs = config.jobs()?;

    let pipelines = [(PipelineKind::Live, live), (PipelineKind::Preview, preview)]
        .into_iter()
        .map(|(kind, result)| CheckedPipeline {
            pipeline: kind.name(),
            error: result.err().map(|e| e.to_string()),
        })
        .collect();

    let output_dir = config.output_dir();
    let rt = tokio::runtime::Runtime::new()?;
    let existing = rt.block_on(storage::list_icons(&output_dir))?;

    let summary = CheckSummary {
        format: config.format.to_string(),
        icon_size: config.icon_size().to_string(),
        supersample: config.supersample,
        output_dir: output_dir.display().to_string(),
        pipelines,
        jobs: jobs
            .iter()
            .map(|job| CheckedJob {
                id: job.id.clone(),
                object: job.object.path.display().to_string(),
                offset: job.offset,
            })
            .collect(),
        existing_icons: existing.len(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Configuration OK");
    println!("  Format:      {}", summary.format);
    println!("  Icon size:   {}", summary.icon_size);
    println!("  Supersample: {}", summary.supersample);
    println!("  Output:      {}", summary.output_dir);
    println!("  Existing:    {} icon(s)", summary.existing_icons);
    println!();
    println!("Pipelines:");
    for checked in &summary.pipelines {
        match &checked.error {
            None => println!("  {:<8} OK", checked.pipeline),
            Some(error) => println!("  {:<8} {}", checked.pipeline, error),
        }
    }
    println!();
    println!("Jobs:");
    for job in &summary.jobs {
        println!("  {} <- {} (offset {})", job.id, job.object, job.offset);
    }

    Ok(())
}

fn load(
    config_path: &Path,
    overrides: &Overrides,
) -> Result<BatchConfig, Box<dyn std::error::Error>> {
    let mut config = BatchConfig::load(config_path)?;
    config.apply_overrides(overrides);
    Ok(config)
}

fn run_batch<S: CaptureStrategy>(
    config: &BatchConfig,
    kind: PipelineKind,
    spec: IconSpec,
    strategy: &mut S,
    jobs: &[IconJob],
) -> AppResult<BatchReport> {
    let output = OutputTarget::new(config.output_dir(), config.file_name(kind));
    let pipeline = IconPipeline::new(spec, output).with_policy(config.failure_policy);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(pipeline.run(strategy, jobs))
}

fn finish(report: &BatchReport, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        for path in report.written() {
            println!("Saved: {}", path.display());
        }
        for (job, error) in report.failed() {
            eprintln!("Failed: {}: {}", job, error);
        }
        for job in &report.not_started {
            eprintln!("Not started: {}", job);
        }
        println!(
            "{} written, {} failed in {} ms",
            report.written().len(),
            report.failed().len(),
            report.elapsed_ms
        );
    }

    if report.is_success() {
        Ok(())
    } else {
        let missing = report.failed().len() + report.not_started.len();
        let total = report.outcomes.len() + report.not_started.len();
        Err(format!("{} of {} jobs did not produce an icon", missing, total).into())
    }
}
