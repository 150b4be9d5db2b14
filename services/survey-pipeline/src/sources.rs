//! Raster sources.
//!
//! A scene on disk is a small YAML manifest next to one raw band file per
//! band (native-endian `f32`, row-major, `width * height` samples):
//!
//! ```yaml
//! id: frt00003e12_07
//! width: 640
//! height: 420
//! bands:
//!   - { name: D2300, path: frt00003e12_d2300.f32 }
//!   - { name: BD1900_2, path: frt00003e12_bd1900.f32, scale: 0.001, offset: 0.0 }
//! crs: { kind: mars_geographic }
//! bounds: { min_x: 77.2, min_y: 18.3, max_x: 77.6, max_y: 18.6 }
//! nodata: 65535
//! label: frt00003e12_07.xml
//! ```
//!
//! Relative paths are resolved against the manifest's directory.

use std::fs;
use std::path::{Path, PathBuf};

use pds_label::{read_bounds, LabelBounds};
use serde::{Deserialize, Serialize};
use survey_common::{Band, BoundingBox, Crs, GeoTransform, Raster};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{PipelineError, Result};

/// File suffix of scene manifests picked up by [`discover_manifests`].
pub const MANIFEST_SUFFIX: &str = ".scene.yaml";

/// Anything that can produce a raster for the pipeline.
pub trait RasterSource: Send + Sync {
    /// Stable identifier, also used in stage cache keys.
    fn id(&self) -> &str;

    /// Load the raster. Failures only affect this source.
    fn load(&self) -> Result<Raster>;

    /// Footprint from an accompanying label, if any.
    fn label_bounds(&self) -> Option<LabelBounds> {
        None
    }

    /// Local solar time of acquisition, if known without a label index.
    fn lst(&self) -> Option<&str> {
        None
    }
}

/// One band file of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandFile {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default)]
    pub offset: Option<f64>,
}

/// Description of a scene on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneManifest {
    pub id: String,
    pub width: usize,
    pub height: usize,
    pub bands: Vec<BandFile>,
    #[serde(default)]
    pub crs: Option<Crs>,
    /// Full affine transform; takes precedence over `bounds`
    #[serde(default)]
    pub transform: Option<GeoTransform>,
    /// Outer edges in CRS units
    #[serde(default)]
    pub bounds: Option<BoundingBox>,
    #[serde(default)]
    pub nodata: Option<f64>,
    /// PDS4 label with the scene footprint and acquisition time
    #[serde(default)]
    pub label: Option<PathBuf>,
    /// Local solar time, `HH:MM:SS`
    #[serde(default)]
    pub lst: Option<String>,
}

impl SceneManifest {
    /// Read a manifest and resolve its paths against its directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        let mut manifest: Self = serde_yaml::from_str(&text).map_err(|e| PipelineError::Yaml {
            path: path.to_path_buf(),
            source: e,
        })?;
        if let Some(dir) = path.parent() {
            manifest.resolve_paths(dir);
        }
        Ok(manifest)
    }

    /// Make relative band and label paths relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for band in &mut self.bands {
            if band.path.is_relative() {
                band.path = base.join(&band.path);
            }
        }
        if let Some(label) = &mut self.label {
            if label.is_relative() {
                *label = base.join(&*label);
            }
        }
    }

    fn transform(&self) -> Option<GeoTransform> {
        self.transform.or_else(|| {
            self.bounds
                .map(|b| GeoTransform::from_bounds(b.min_x, b.min_y, b.max_x, b.max_y, self.width, self.height))
        })
    }
}

/// Every `*.scene.yaml` manifest under `dir`, sorted by path.
pub fn discover_manifests(dir: impl AsRef<Path>) -> Result<Vec<SceneManifest>> {
    let dir = dir.as_ref();
    let mut manifests = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| PipelineError::io(dir, e.into()))?;
        let is_manifest = entry.file_type().is_file()
            && entry
                .file_name()
                .to_str()
                .map_or(false, |n| n.ends_with(MANIFEST_SUFFIX));
        if is_manifest {
            manifests.push(SceneManifest::load(entry.path())?);
        }
    }
    debug!(dir = %dir.display(), count = manifests.len(), "Discovered scene manifests");
    Ok(manifests)
}

/// Read `len` native-endian `f32` samples.
pub fn read_f32_band(path: &Path, len: usize) -> Result<Vec<f32>> {
    let bytes = fs::read(path).map_err(|e| PipelineError::io(path, e))?;
    let expected = len * std::mem::size_of::<f32>();
    if bytes.len() != expected {
        return Err(PipelineError::invalid_scene(
            path.display().to_string(),
            format!("expected {expected} bytes, found {}", bytes.len()),
        ));
    }
    let mut data = vec![0f32; len];
    bytemuck::cast_slice_mut::<f32, u8>(&mut data).copy_from_slice(&bytes);
    Ok(data)
}

/// Write samples in the layout [`read_f32_band`] expects.
pub fn write_f32_band(path: &Path, data: &[f32]) -> Result<()> {
    fs::write(path, bytemuck::cast_slice::<f32, u8>(data)).map_err(|e| PipelineError::io(path, e))
}

/// Scene backed by a manifest and raw band files.
#[derive(Debug, Clone)]
pub struct RawSceneSource {
    manifest: SceneManifest,
}

impl RawSceneSource {
    pub fn new(manifest: SceneManifest) -> Self {
        Self { manifest }
    }

    pub fn manifest(&self) -> &SceneManifest {
        &self.manifest
    }
}

impl RasterSource for RawSceneSource {
    fn id(&self) -> &str {
        &self.manifest.id
    }

    fn load(&self) -> Result<Raster> {
        let m = &self.manifest;
        let len = m.width * m.height;
        if len == 0 {
            return Err(PipelineError::invalid_scene(&m.id, "zero-sized raster"));
        }

        let bands = m
            .bands
            .iter()
            .map(|b| {
                let data = read_f32_band(&b.path, len)?;
                let band = Band::new(&b.name, data);
                Ok(match (b.scale, b.offset) {
                    (None, None) => band,
                    (scale, offset) => band.with_scale_offset(scale.unwrap_or(1.0), offset.unwrap_or(0.0)),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut raster = Raster::new(&m.id, m.width, m.height, bands)?;
        if let Some(t) = m.transform() {
            raster = raster.with_transform(t);
        }
        if let Some(crs) = m.crs {
            raster = raster.with_crs(crs);
        }
        if let Some(nodata) = m.nodata {
            raster = raster.with_nodata(nodata);
        }
        debug!(scene = %m.id, bands = raster.bands.len(), "Loaded scene");
        Ok(raster)
    }

    fn label_bounds(&self) -> Option<LabelBounds> {
        let path = self.manifest.label.as_ref()?;
        match read_bounds(path) {
            Ok(bounds) => bounds,
            Err(e) => {
                warn!(scene = %self.manifest.id, label = %path.display(), error = %e, "Cannot read label bounds");
                None
            }
        }
    }

    fn lst(&self) -> Option<&str> {
        self.manifest.lst.as_deref()
    }
}

/// Scene already in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    raster: Raster,
    label: Option<LabelBounds>,
    lst: Option<String>,
}

impl MemorySource {
    pub fn new(raster: Raster) -> Self {
        Self {
            raster,
            label: None,
            lst: None,
        }
    }

    pub fn with_label(mut self, bounds: LabelBounds) -> Self {
        self.label = Some(bounds);
        self
    }

    pub fn with_lst(mut self, lst: impl Into<String>) -> Self {
        self.lst = Some(lst.into());
        self
    }
}

impl RasterSource for MemorySource {
    fn id(&self) -> &str {
        &self.raster.source
    }

    fn load(&self) -> Result<Raster> {
        Ok(self.raster.clone())
    }

    fn label_bounds(&self) -> Option<LabelBounds> {
        self.label
    }

    fn lst(&self) -> Option<&str> {
        self.lst.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_file_round_trip_and_size_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.f32");
        write_f32_band(&path, &[1.0, -2.5, f32::NAN, 4.0]).unwrap();

        let data = read_f32_band(&path, 4).unwrap();
        assert_eq!(&data[..2], &[1.0, -2.5]);
        assert!(data[2].is_nan());
        assert!(matches!(read_f32_band(&path, 5), Err(PipelineError::InvalidScene { .. })));
    }

    #[test]
    fn test_manifest_load_resolves_paths() {
        let dir = tempfile::tempdir().unwrap();
        write_f32_band(&dir.path().join("bt.f32"), &[0.0, 210.0, 215.0, 220.0]).unwrap();
        let manifest = "\
id: I01234002
width: 2
height: 2
bands:
  - { name: BT, path: bt.f32 }
crs: { kind: mars_geographic }
bounds: { min_x: 77.0, min_y: 18.0, max_x: 77.1, max_y: 18.1 }
lst: \"05:31:00\"
";
        let path = dir.path().join("I01234002.scene.yaml");
        fs::write(&path, manifest).unwrap();

        let found = discover_manifests(dir.path()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].bands[0].path, dir.path().join("bt.f32"));

        let source = RawSceneSource::new(found[0].clone());
        let raster = source.load().unwrap();
        assert!(raster.has_georeference());
        assert_eq!(raster.crs, Some(Crs::MarsGeographic));
        assert_eq!(source.lst(), Some("05:31:00"));
        assert!(source.label_bounds().is_none());
    }
}
