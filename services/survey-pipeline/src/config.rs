//! Pipeline configuration.
//!
//! Loaded from one YAML file. `${VAR}` and `${VAR:-default}` are expanded
//! from the environment before parsing, and `SURVEY_*` variables override
//! the grid and classifier sections afterwards. Relative paths are taken
//! relative to the config file.

use std::fs;
use std::path::{Path, PathBuf};

use grid_processor::{CellGrid, GridProcessorConfig, Reducer};
use serde::{Deserialize, Serialize};
use site_classifier::ClassifierConfig;
use survey_common::BoundingBox;

use crate::error::{PipelineError, Result};

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory receiving CSV tables and the run report
    pub output_dir: PathBuf,

    pub grid: GridProcessorConfig,

    pub classifier: ClassifierConfig,

    pub spectral: Option<SpectralInputs>,

    pub thermal: Option<ThermalInputs>,

    pub topography: Option<TopographyInputs>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("survey-output"),
            grid: GridProcessorConfig::default(),
            classifier: ClassifierConfig::default(),
            spectral: None,
            thermal: None,
            topography: None,
        }
    }
}

/// Multi-band spectral index scenes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralInputs {
    /// Survey area in degrees
    pub bbox: BoundingBox,
    #[serde(default = "default_spectral_reducer")]
    pub reducer: Reducer,
    /// Scene manifest files
    #[serde(default)]
    pub scenes: Vec<PathBuf>,
    /// Directory searched for `*.scene.yaml` manifests
    #[serde(default)]
    pub scene_dir: Option<PathBuf>,
}

/// Single-band brightness temperature tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalInputs {
    pub bbox: BoundingBox,
    #[serde(default = "default_thermal_reducer")]
    pub reducer: Reducer,
    #[serde(default)]
    pub scenes: Vec<PathBuf>,
    #[serde(default)]
    pub scene_dir: Option<PathBuf>,
    /// PDS4 labels indexed by local solar time; matched to scenes by file stem
    #[serde(default)]
    pub label_dir: Option<PathBuf>,
    /// Largest LST distance at which a scene still joins a slot
    #[serde(default = "default_slot_tolerance")]
    pub slot_tolerance_minutes: f64,
    /// Nodata assumed for tiles that declare none
    #[serde(default)]
    pub default_nodata: f64,
}

/// One elevation tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopographyInputs {
    /// Scene manifest of the elevation model
    pub scene: PathBuf,
    /// Survey area the tile is cropped to; the whole tile when unset
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
    /// PDS3 label carrying `MAP_SCALE` or `MAP_RESOLUTION`
    #[serde(default)]
    pub pds3_label: Option<PathBuf>,
}

fn default_spectral_reducer() -> Reducer {
    Reducer::Maximum
}

fn default_thermal_reducer() -> Reducer {
    Reducer::Median
}

fn default_slot_tolerance() -> f64 {
    30.0
}

impl PipelineConfig {
    /// Load and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        let expanded = expand_env_vars(&content)?;
        let mut config: Self = serde_yaml::from_str(&expanded).map_err(|e| PipelineError::Yaml {
            path: path.to_path_buf(),
            source: e,
        })?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        config.apply_env();
        config.validate().map_err(PipelineError::InvalidConfig)?;
        Ok(config)
    }

    /// Defaults plus `SURVEY_*` overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    pub fn apply_env(&mut self) {
        self.grid.apply_env();
        self.classifier.apply_env();
        if let Ok(dir) = std::env::var("SURVEY_OUTPUT_DIR") {
            if !dir.is_empty() {
                self.output_dir = PathBuf::from(dir);
            }
        }
    }

    /// Anchor every relative path at `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let anchor = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };

        anchor(&mut self.output_dir);
        if let Some(dir) = &mut self.grid.stage_cache_dir {
            anchor(dir);
        }
        if let Some(s) = &mut self.spectral {
            s.scenes.iter_mut().chain(s.scene_dir.as_mut()).for_each(anchor);
        }
        if let Some(t) = &mut self.thermal {
            t.scenes
                .iter_mut()
                .chain(t.scene_dir.as_mut())
                .chain(t.label_dir.as_mut())
                .for_each(anchor);
        }
        if let Some(m) = &mut self.topography {
            anchor(&mut m.scene);
            if let Some(label) = &mut m.pds3_label {
                anchor(label);
            }
        }
    }

    /// Point every configured workflow at another survey area.
    pub fn override_bbox(&mut self, bbox: BoundingBox) {
        if let Some(s) = &mut self.spectral {
            s.bbox = bbox;
        }
        if let Some(t) = &mut self.thermal {
            t.bbox = bbox;
        }
        if let Some(m) = &mut self.topography {
            m.bbox = Some(bbox);
        }
    }

    pub fn cell_grid(&self) -> CellGrid {
        CellGrid::new(self.grid.cell_rows, self.grid.cell_cols)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        self.grid.validate().map_err(|e| format!("grid: {e}"))?;
        self.classifier.validate().map_err(|e| format!("classifier: {e}"))?;

        if let Some(s) = &self.spectral {
            if !s.bbox.is_valid() {
                return Err("spectral: bbox must have min < max".to_string());
            }
            if s.scenes.is_empty() && s.scene_dir.is_none() {
                return Err("spectral: no scenes or scene_dir given".to_string());
            }
        }
        if let Some(t) = &self.thermal {
            if !t.bbox.is_valid() {
                return Err("thermal: bbox must have min < max".to_string());
            }
            if t.scenes.is_empty() && t.scene_dir.is_none() {
                return Err("thermal: no scenes or scene_dir given".to_string());
            }
            if !(t.slot_tolerance_minutes.is_finite() && t.slot_tolerance_minutes >= 0.0) {
                return Err("thermal: slot_tolerance_minutes must be >= 0".to_string());
            }
        }
        if let Some(bbox) = self.topography.as_ref().and_then(|m| m.bbox.as_ref()) {
            if !bbox.is_valid() {
                return Err("topography: bbox must have min < max".to_string());
            }
        }
        Ok(())
    }
}

/// Expand `${VAR}` and `${VAR:-default}` in config text.
pub fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut var_expr = String::new();
            let mut depth = 1;
            while depth > 0 {
                match chars.next() {
                    Some('{') => {
                        depth += 1;
                        var_expr.push('{');
                    }
                    Some('}') => {
                        depth -= 1;
                        if depth > 0 {
                            var_expr.push('}');
                        }
                    }
                    Some(c) => var_expr.push(c),
                    None => {
                        return Err(PipelineError::InvalidConfig(format!(
                            "unclosed variable substitution: ${{{var_expr}"
                        )))
                    }
                }
            }
            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((name, default)) = expr.split_once(":-") {
        match std::env::var(name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim())
            .map_err(|_| PipelineError::InvalidConfig(format!("environment variable {expr} not set")))
    }
}
