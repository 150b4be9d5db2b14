//! Site survey batch runner.
//!
//! Loads a YAML configuration, runs the selected workflows and writes CSV
//! tables plus `run_report.json` to the output directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use survey_common::BoundingBox;
use survey_pipeline::{Pipeline, PipelineConfig, Workflow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum WorkflowArg {
    All,
    Spectral,
    Thermal,
    Topography,
}

/// Site survey over CRISM, THEMIS and MOLA rasters
#[derive(Parser, Debug)]
#[command(name = "survey-pipeline")]
#[command(about = "Mosaic, aggregate and classify candidate landing sites")]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "SURVEY_CONFIG")]
    config: PathBuf,

    /// Override the configured output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Survey area as `west,south,east,north` degrees, replacing the
    /// configured survey areas and cropping the elevation tile
    #[arg(long, value_parser = BoundingBox::from_csv_string)]
    bbox: Option<BoundingBox>,

    /// Workflows to run; repeatable
    #[arg(short, long, value_enum, default_value = "all")]
    workflow: Vec<WorkflowArg>,

    /// Number of worker threads (default: one per core)
    #[arg(long, env = "SURVEY_WORKER_THREADS")]
    threads: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Emit JSON log lines
    #[arg(long)]
    log_json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let builder = fmt().with_env_filter(filter).with_target(true).with_level(true);
    if args.log_json {
        builder.json().init();
    } else {
        builder.init();
    }

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    let mut config = PipelineConfig::load(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if let Some(bbox) = args.bbox {
        config.override_bbox(bbox);
    }

    let workflows = selected_workflows(&args.workflow);
    info!(
        config = %args.config.display(),
        output_dir = %config.output_dir.display(),
        workflows = ?workflows,
        "Starting site survey"
    );

    let mut pipeline = Pipeline::new(config).context("Failed to initialize pipeline")?;
    let report = pipeline.run(&workflows).context("Survey run failed")?;

    if let Some(s) = &report.spectral {
        info!(population = s.population, passed = s.passed, skipped = s.skipped.len(), "Spectral");
    }
    if let Some(t) = &report.thermal {
        info!(slots = t.slots.len(), kelvin = t.converted_from_kelvin, skipped = t.skipped.len(), "Thermal");
    }
    if let Some(m) = &report.topography {
        info!(dx_m = m.dx_m, dy_m = m.dy_m, "Topography");
    }
    Ok(())
}

fn selected_workflows(args: &[WorkflowArg]) -> Vec<Workflow> {
    if args.is_empty() || args.contains(&WorkflowArg::All) {
        return Workflow::ALL.to_vec();
    }
    let mut out = Vec::new();
    for arg in args {
        let w = match arg {
            WorkflowArg::All => continue,
            WorkflowArg::Spectral => Workflow::Spectral,
            WorkflowArg::Thermal => Workflow::Thermal,
            WorkflowArg::Topography => Workflow::Topography,
        };
        if !out.contains(&w) {
            out.push(w);
        }
    }
    out
}
