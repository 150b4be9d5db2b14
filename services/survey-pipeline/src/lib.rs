//! Site survey pipeline.
//!
//! Runs the spectral (CRISM index), thermal (THEMIS brightness temperature)
//! and topography (MOLA elevation) workflows over a survey area and writes
//! per-cell CSV tables. Sources are described by small YAML manifests over
//! raw `f32` band files, or supplied in memory through [`RasterSource`].
//!
//! ```ignore
//! use survey_pipeline::{Pipeline, PipelineConfig, Workflow};
//!
//! let config = PipelineConfig::load("survey.yaml")?;
//! let mut pipeline = Pipeline::new(config)?;
//! let report = pipeline.run(&Workflow::ALL)?;
//! println!("{} spectral cells passed", report.spectral.map_or(0, |s| s.passed));
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod sources;

pub use config::{expand_env_vars, PipelineConfig, SpectralInputs, ThermalInputs, TopographyInputs};
pub use error::{PipelineError, Result};
pub use pipeline::{
    load_sources, BoxedSource, Pipeline, RunReport, SkippedScene, SpectralReport, SpectralResult, ThermalReport,
    ThermalResult, TopographyReport, TopographyResult, Workflow, RUN_REPORT,
};
pub use sources::{
    discover_manifests, read_f32_band, write_f32_band, BandFile, MemorySource, RasterSource, RawSceneSource,
    SceneManifest, MANIFEST_SUFFIX,
};
