//! Error types for the survey pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a workflow.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("configuration error: {0}")]
    InvalidConfig(String),

    /// A scene manifest or raw band file does not describe a usable raster.
    #[error("scene '{scene}': {reason}")]
    InvalidScene { scene: String, reason: String },

    #[error(transparent)]
    Survey(#[from] survey_common::SurveyError),

    #[error(transparent)]
    Label(#[from] pds_label::LabelError),

    #[error(transparent)]
    Grid(#[from] grid_processor::GridProcessorError),

    #[error(transparent)]
    Classifier(#[from] site_classifier::ClassifierError),

    #[error("failed to write report: {0}")]
    Report(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_scene(scene: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidScene {
            scene: scene.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
