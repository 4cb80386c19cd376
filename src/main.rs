// SPDX-License-Identifier: GPL-3.0-only

use clap::{Args, Parser, Subcommand};
use icon_capture::backends::host::Dimensions;
use icon_capture::config::Overrides;
use icon_capture::constants::DEFAULT_RENDER_RESOLUTION;
use icon_capture::pipelines::icon::{BackgroundMode, FailurePolicy, IconFormat};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "icon-capture")]
#[command(about = "Render objects and previews to icon files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render each object on the software host and crop the frame
    Live {
        /// Batch configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Native render resolution, e.g. 1024x1024
        #[arg(short, long, default_value_t = DEFAULT_RENDER_RESOLUTION)]
        resolution: Dimensions,

        #[command(flatten)]
        overrides: OverrideArgs,

        /// Print the batch report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Recolor the background of pre-rendered previews
    Preview {
        /// Batch configuration file
        #[arg(short, long)]
        config: PathBuf,

        #[command(flatten)]
        overrides: OverrideArgs,

        /// Print the batch report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a configuration and list its jobs
    Check {
        /// Batch configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Print the resolved batch as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct OverrideArgs {
    /// Output format (jpeg, png, tga)
    #[arg(short, long)]
    format: Option<IconFormat>,

    /// Icon size, e.g. 256x256
    #[arg(short, long)]
    size: Option<Dimensions>,

    /// Supersample factor
    #[arg(long)]
    supersample: Option<u32>,

    /// Live background (solid, transparent)
    #[arg(short, long)]
    background: Option<BackgroundMode>,

    /// Failure policy (skip, abort)
    #[arg(long)]
    policy: Option<FailurePolicy>,
}

impl From<OverrideArgs> for Overrides {
    fn from(args: OverrideArgs) -> Self {
        Overrides {
            format: args.format,
            icon_size: args.size,
            supersample: args.supersample,
            background: args.background,
            failure_policy: args.policy,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=icon_capture=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Live {
            config,
            resolution,
            overrides,
            json,
        } => cli::run_live(&config, resolution, overrides.into(), json),
        Commands::Preview {
            config,
            overrides,
            json,
        } => cli::run_preview(&config, overrides.into(), json),
        Commands::Check { config, json } => cli::check(&config, json),
    }
}
