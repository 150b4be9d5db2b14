//! The three survey workflows.
//!
//! Each workflow takes its sources through the same stages:
//!
//! ```text
//! spectral:    load → alias bands → reproject → footprint mask → max mosaic
//!              → cell means → mineral shares → adaptive classifier
//! thermal:     load → LST slot → reproject → median mosaic per slot
//!              → cell means → °C → tiered flagger
//! topography:  load → crop → slope/roughness/TRI → cell means
//! ```
//!
//! Mosaics go through the [`StageCache`], so a rerun with unchanged inputs
//! skips reprojection. A source that fails to load or cannot be placed is
//! skipped with a warning; a mosaic with no surviving source aborts the
//! workflow.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use grid_processor::{
    aggregate_cells, apply_footprint_mask, composite, crop_to_bbox, roughness_std, slope_degrees, stage_key,
    terrain_ruggedness_index, CacheStats, CellTable, GridProcessorError, GridSpec, Mosaic, Reducer,
    Reprojector, StageCache, StageKey,
};
use pds_label::{build_lst_index, parse_pixel_scale, PixelScale};
use projection::MARS_RADIUS_M;
use rayon::prelude::*;
use serde::Serialize;
use site_classifier::table::{
    create_file, write_adaptive_results, write_cell_table, write_landing_flags, write_mineral_cells,
    write_slot_flags, write_slot_means, write_slot_status, write_slot_summaries,
};
use site_classifier::{
    good_site_composition, mineral_cells, slot_summaries, to_celsius_if_kelvin, AdaptiveClassifier,
    AdaptiveOutcome, ClassifierWarning, MineralCell, MineralShares, SlotSummary, SlotTable, TieredFlagger,
    TieredOutcome, TRACKED_BANDS,
};
use survey_common::{BoundingBox, Crs, LocalSolarTime, Raster, TimeSlot};
use tracing::{debug, info, warn};

use crate::config::{PipelineConfig, SpectralInputs, ThermalInputs, TopographyInputs};
use crate::error::{PipelineError, Result};
use crate::sources::{discover_manifests, RasterSource, RawSceneSource, SceneManifest};

/// Owned, shareable raster source.
pub type BoxedSource = Box<dyn RasterSource>;

/// Workflows the pipeline can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Workflow {
    Spectral,
    Thermal,
    Topography,
}

impl Workflow {
    pub const ALL: [Workflow; 3] = [Self::Spectral, Self::Thermal, Self::Topography];
}

/// A source left out of a mosaic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedScene {
    pub scene: String,
    pub reason: String,
}

impl SkippedScene {
    fn new(scene: &str, reason: impl ToString) -> Self {
        warn!(scene = %scene, reason = %reason.to_string(), "Skipping scene");
        Self {
            scene: scene.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Spectral workflow output.
#[derive(Debug, Clone)]
pub struct SpectralResult {
    pub grid: GridSpec,
    pub table: CellTable,
    pub cells: Vec<MineralCell>,
    pub outcome: AdaptiveOutcome,
    pub composition: Option<MineralShares>,
    /// `None` when the mosaics came from the stage cache
    pub scenes_used: Option<usize>,
    pub skipped: Vec<SkippedScene>,
}

/// Thermal workflow output.
#[derive(Debug, Clone)]
pub struct ThermalResult {
    pub grid: GridSpec,
    pub table: SlotTable,
    pub outcome: TieredOutcome,
    pub summaries: Vec<SlotSummary>,
    pub converted_from_kelvin: bool,
    /// Scenes mosaicked into each slot that has any, in slot order;
    /// `None` when the slot mosaic came from the stage cache
    pub scenes_per_slot: Vec<(String, Option<usize>)>,
    pub skipped: Vec<SkippedScene>,
}

/// Topography workflow output.
#[derive(Debug, Clone)]
pub struct TopographyResult {
    pub table: CellTable,
    /// Elevation pixels used, after any crop
    pub width: usize,
    pub height: usize,
    pub dx_m: f64,
    pub dy_m: f64,
    pub pixel_scale: Option<PixelScale>,
    pub slope_range: Option<(f32, f32)>,
}

/// Summary of one spectral run, as written to the run report.
#[derive(Debug, Clone, Serialize)]
pub struct SpectralReport {
    pub grid_width: usize,
    pub grid_height: usize,
    pub scenes_used: Option<usize>,
    pub skipped: Vec<SkippedScene>,
    pub population: usize,
    pub passed: usize,
    pub score_gate: Option<f64>,
    pub composition: Option<MineralShares>,
    pub warnings: Vec<ClassifierWarning>,
    pub tables: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThermalReport {
    pub grid_width: usize,
    pub grid_height: usize,
    pub scenes_per_slot: Vec<(String, Option<usize>)>,
    pub skipped: Vec<SkippedScene>,
    pub converted_from_kelvin: bool,
    pub slots: Vec<SlotSummary>,
    pub warnings: Vec<ClassifierWarning>,
    pub tables: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopographyReport {
    pub width: usize,
    pub height: usize,
    pub dx_m: f64,
    pub dy_m: f64,
    pub pixel_scale: Option<PixelScale>,
    pub slope_range: Option<(f32, f32)>,
    pub tables: Vec<PathBuf>,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub spectral: Option<SpectralReport>,
    pub thermal: Option<ThermalReport>,
    pub topography: Option<TopographyReport>,
    pub cache: CacheStats,
}

/// File name of the JSON run report in the output directory.
pub const RUN_REPORT: &str = "run_report.json";

/// Survey pipeline with its stage cache.
pub struct Pipeline {
    config: PipelineConfig,
    cache: StageCache,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate().map_err(PipelineError::InvalidConfig)?;

        let mut cache = StageCache::new(config.grid.stage_cache_size_bytes());
        if let Some(dir) = &config.grid.stage_cache_dir {
            cache = cache.with_disk_dir(dir)?;
        }
        Ok(Self { config, cache })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Run the selected workflows that are configured, write their tables
    /// and the run report.
    pub fn run(&mut self, workflows: &[Workflow]) -> Result<RunReport> {
        let started_at = Utc::now();
        let out = self.config.output_dir.clone();
        fs::create_dir_all(&out).map_err(|e| PipelineError::io(&out, e))?;

        let mut report = RunReport {
            started_at,
            finished_at: started_at,
            spectral: None,
            thermal: None,
            topography: None,
            cache: CacheStats::default(),
        };

        for workflow in workflows {
            match workflow {
                Workflow::Spectral => {
                    let Some(inputs) = self.config.spectral.clone() else {
                        info!("No spectral inputs configured");
                        continue;
                    };
                    report.spectral = Some(self.run_spectral(&inputs)?);
                }
                Workflow::Thermal => {
                    let Some(inputs) = self.config.thermal.clone() else {
                        info!("No thermal inputs configured");
                        continue;
                    };
                    report.thermal = Some(self.run_thermal(&inputs)?);
                }
                Workflow::Topography => {
                    let Some(inputs) = self.config.topography.clone() else {
                        info!("No topography inputs configured");
                        continue;
                    };
                    report.topography = Some(self.run_topography(&inputs)?);
                }
            }
        }

        report.finished_at = Utc::now();
        report.cache = self.cache.stats();

        let path = out.join(RUN_REPORT);
        let file = fs::File::create(&path).map_err(|e| PipelineError::io(&path, e))?;
        serde_json::to_writer_pretty(file, &report)?;
        info!(
            report = %path.display(),
            elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
            cache_hit_rate = report.cache.hit_rate(),
            "Run complete"
        );
        Ok(report)
    }

    /// Spectral workflow from configured manifests, with table export.
    pub fn run_spectral(&mut self, inputs: &SpectralInputs) -> Result<SpectralReport> {
        let sources = load_sources(&inputs.scenes, inputs.scene_dir.as_ref())?;
        let result = self.spectral(&inputs.bbox, inputs.reducer, &sources)?;

        let out = &self.config.output_dir;
        let tables = vec![
            out.join("spectral_cell_means.csv"),
            out.join("spectral_adaptive.csv"),
            out.join("spectral_landing_flags.csv"),
        ];
        write_mineral_cells(create_file(&tables[0])?, &result.cells)?;
        write_adaptive_results(create_file(&tables[1])?, &result.outcome, ["% H2O", "% Fe/Mg", "% Al-OH"])?;
        write_landing_flags(create_file(&tables[2])?, &result.outcome)?;

        Ok(SpectralReport {
            grid_width: result.grid.width,
            grid_height: result.grid.height,
            scenes_used: result.scenes_used,
            skipped: result.skipped,
            population: result.outcome.population,
            passed: result.outcome.pass_count(),
            score_gate: result.outcome.score_gate,
            composition: result.composition,
            warnings: result.outcome.warnings,
            tables,
        })
    }

    /// Thermal workflow from configured manifests and labels, with table
    /// export.
    pub fn run_thermal(&mut self, inputs: &ThermalInputs) -> Result<ThermalReport> {
        let sources = load_sources(&inputs.scenes, inputs.scene_dir.as_ref())?;
        let lst_index = match &inputs.label_dir {
            Some(dir) => build_lst_index(dir)?
                .into_iter()
                .filter_map(|e| e.lst.map(|lst| (e.file_id, lst)))
                .collect(),
            None => HashMap::new(),
        };
        let result = self.thermal(inputs, &sources, &lst_index)?;

        let out = &self.config.output_dir;
        let tables = vec![
            out.join("thermal_slot_means.csv"),
            out.join("thermal_slot_flags.csv"),
            out.join("thermal_slot_status.csv"),
            out.join("thermal_slot_summary.csv"),
        ];
        write_slot_means(create_file(&tables[0])?, &result.table)?;
        write_slot_flags(create_file(&tables[1])?, &result.outcome)?;
        write_slot_status(create_file(&tables[2])?, &result.outcome)?;
        write_slot_summaries(create_file(&tables[3])?, &result.summaries)?;

        Ok(ThermalReport {
            grid_width: result.grid.width,
            grid_height: result.grid.height,
            scenes_per_slot: result.scenes_per_slot,
            skipped: result.skipped,
            converted_from_kelvin: result.converted_from_kelvin,
            slots: result.summaries,
            warnings: result.outcome.warnings,
            tables,
        })
    }

    /// Topography workflow from a configured manifest, with table export.
    pub fn run_topography(&mut self, inputs: &TopographyInputs) -> Result<TopographyReport> {
        let source = RawSceneSource::new(SceneManifest::load(&inputs.scene)?);
        let pixel_scale = match &inputs.pds3_label {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
                Some(parse_pixel_scale(&text)?)
            }
            None => None,
        };
        let result = self.topography(&source, pixel_scale, inputs.bbox.as_ref())?;

        let path = self.config.output_dir.join("topography_slope_grid.csv");
        write_cell_table(create_file(&path)?, &result.table)?;

        Ok(TopographyReport {
            width: result.width,
            height: result.height,
            dx_m: result.dx_m,
            dy_m: result.dy_m,
            pixel_scale: result.pixel_scale,
            slope_range: result.slope_range,
            tables: vec![path],
        })
    }

    /// Mosaic, aggregate and classify spectral index scenes.
    pub fn spectral(&mut self, bbox: &BoundingBox, reducer: Reducer, sources: &[BoxedSource]) -> Result<SpectralResult> {
        let grid = self.survey_grid(bbox)?;
        let ids: Vec<&str> = sources.iter().map(|s| s.id()).collect();
        let keys: Vec<StageKey> = TRACKED_BANDS
            .iter()
            .map(|(band, _)| self.mosaic_key("spectral", band, reducer, &grid, &ids))
            .collect();

        let cached: Option<Vec<Mosaic>> = keys.iter().map(|k| self.cache.get(*k)).collect();
        let (mosaics, scenes_used, skipped) = match cached {
            Some(mosaics) => {
                info!(scenes = sources.len(), "Spectral mosaics loaded from stage cache");
                (mosaics, None, Vec::new())
            }
            None => {
                let (layers, used, skipped) = self.reproject_spectral(&grid, sources);
                let mut mosaics = Vec::with_capacity(layers.len());
                for ((band, _), (key, band_layers)) in TRACKED_BANDS.iter().zip(keys.iter().zip(&layers)) {
                    let mosaic = composite(band, band_layers, grid.width, grid.height, reducer)?;
                    if let Err(e) = self.cache.insert(*key, mosaic.clone()) {
                        warn!(band = %band, error = %e, "Cannot cache mosaic");
                    }
                    mosaics.push(mosaic);
                }
                (mosaics, Some(used), skipped)
            }
        };

        let refs: Vec<&Mosaic> = mosaics.iter().collect();
        let table = aggregate_cells(&refs, self.config.cell_grid())?;
        let cells = mineral_cells(&table)?;
        let inputs: Vec<_> = cells.iter().map(|c| c.to_adaptive_input()).collect();
        let outcome = AdaptiveClassifier::new(self.config.classifier.adaptive.clone())?.classify(&inputs);
        let composition = good_site_composition(&cells, &outcome);

        if let Some(c) = &composition {
            info!(
                fe_mg = c.fe_mg,
                al_oh = c.al_oh,
                h2o = c.h2o,
                "Mean mineral shares over passing cells"
            );
        }

        Ok(SpectralResult {
            grid,
            table,
            cells,
            outcome,
            composition,
            scenes_used,
            skipped,
        })
    }

    /// Reproject the tracked bands of every source, one layer list per band.
    fn reproject_spectral(&self, grid: &GridSpec, sources: &[BoxedSource]) -> (Vec<Vec<Vec<f32>>>, usize, Vec<SkippedScene>) {
        let reprojector = Reprojector::new(grid, self.config.grid.interpolation);
        let epsilon = self.config.grid.footprint_epsilon;

        let results: Vec<std::result::Result<Vec<Vec<f32>>, SkippedScene>> = sources
            .par_iter()
            .map(|src| {
                let raster = src.load().map_err(|e| SkippedScene::new(src.id(), e))?;
                let indices = TRACKED_BANDS
                    .iter()
                    .map(|(band, aliases)| {
                        raster
                            .find_band_index(aliases)
                            .ok_or_else(|| SkippedScene::new(src.id(), format!("no {band} band")))
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()?;

                let label = src.label_bounds();
                let mut bands = reprojector
                    .reproject_bands(&raster, &indices, label.as_ref())
                    .map_err(|e| SkippedScene::new(src.id(), e))?;
                let masked = apply_footprint_mask(&mut bands, epsilon).map_err(|e| SkippedScene::new(src.id(), e))?;
                debug!(scene = %src.id(), masked, "Reprojected spectral scene");
                Ok(bands)
            })
            .collect();

        let mut layers: Vec<Vec<Vec<f32>>> = vec![Vec::new(); TRACKED_BANDS.len()];
        let mut skipped = Vec::new();
        let mut used = 0;
        for r in results {
            match r {
                Ok(bands) => {
                    used += 1;
                    for (k, band) in bands.into_iter().enumerate() {
                        layers[k].push(band);
                    }
                }
                Err(s) => skipped.push(s),
            }
        }
        info!(used, skipped = skipped.len(), "Spectral scenes reprojected");
        (layers, used, skipped)
    }

    /// Mosaic thermal tiles per time slot, aggregate and flag.
    ///
    /// A source's local solar time comes from the source itself or from
    /// `lst_index` (scene id to LST).
    pub fn thermal(
        &mut self,
        inputs: &ThermalInputs,
        sources: &[BoxedSource],
        lst_index: &HashMap<String, String>,
    ) -> Result<ThermalResult> {
        let grid = self.survey_grid(&inputs.bbox)?;
        let slots = self
            .config
            .classifier
            .tiered
            .slot_names()
            .into_iter()
            .map(TimeSlot::from_name)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut skipped = Vec::new();
        let mut members: Vec<Vec<&dyn RasterSource>> = vec![Vec::new(); slots.len()];
        for src in sources {
            let lst = src.lst().or_else(|| lst_index.get(src.id()).map(String::as_str));
            let Some(lst) = lst.and_then(|s| LocalSolarTime::parse(s).ok()) else {
                skipped.push(SkippedScene::new(src.id(), "no local solar time"));
                continue;
            };
            let slot = TimeSlot::nearest(&slots, &lst, inputs.slot_tolerance_minutes)
                .and_then(|nearest| slots.iter().position(|s| s.name == nearest.name));
            match slot {
                Some(i) => members[i].push(&**src),
                None => skipped.push(SkippedScene::new(src.id(), format!("LST {lst} outside every slot"))),
            }
        }

        let reprojector = Reprojector::new(&grid, self.config.grid.interpolation);
        let cell_grid = self.config.cell_grid();
        let mut slot_tables: Vec<(String, CellTable)> = Vec::new();
        let mut scenes_per_slot = Vec::new();

        for (slot, group) in slots.iter().zip(&members) {
            if group.is_empty() {
                warn!(slot = %slot.name, "No scenes in slot");
                continue;
            }
            let ids: Vec<&str> = group.iter().map(|s| s.id()).collect();
            let key = self.mosaic_key("thermal", &slot.name, inputs.reducer, &grid, &ids);
            let nodata = inputs.default_nodata;

            let mut slot_skipped = Vec::new();
            let mut recomputed = false;
            let computed = self.cache.get_or_compute(key, || {
                recomputed = true;
                let results: Vec<std::result::Result<Vec<f32>, SkippedScene>> = group
                    .par_iter()
                    .map(|src| reproject_thermal(&reprojector, *src, nodata))
                    .collect();
                let mut layers = Vec::with_capacity(results.len());
                for r in results {
                    match r {
                        Ok(layer) => layers.push(layer),
                        Err(s) => slot_skipped.push(s),
                    }
                }
                composite(&slot.name, &layers, grid.width, grid.height, inputs.reducer)
            });
            let used = recomputed.then(|| group.len() - slot_skipped.len());
            skipped.append(&mut slot_skipped);
            let mosaic = match computed {
                Ok(m) => m,
                Err(GridProcessorError::NoValidScenes { .. }) => {
                    warn!(slot = %slot.name, "Every scene in slot was skipped");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            info!(
                slot = %slot.name,
                scenes = ?used,
                cached = !recomputed,
                valid_pixels = mosaic.valid_count(),
                "Slot mosaic ready"
            );

            scenes_per_slot.push((slot.name.clone(), used));
            slot_tables.push((slot.name.clone(), aggregate_cells(&[&mosaic], cell_grid)?));
        }

        if slot_tables.is_empty() {
            return Err(GridProcessorError::no_valid_scenes("brightness temperature").into());
        }

        let pairs: Vec<(&str, &CellTable)> = slot_tables.iter().map(|(n, t)| (n.as_str(), t)).collect();
        let mut table = SlotTable::from_cell_tables(&pairs)?;
        let converted_from_kelvin = to_celsius_if_kelvin(&mut table.values, self.config.classifier.tiered.kelvin_threshold);

        let outcome = TieredFlagger::new(self.config.classifier.tiered.clone())?.flag(&table)?;
        let summaries = slot_summaries(&outcome);

        Ok(ThermalResult {
            grid,
            table,
            outcome,
            summaries,
            converted_from_kelvin,
            scenes_per_slot,
            skipped,
        })
    }

    /// Terrain derivatives of one elevation tile, averaged per cell.
    ///
    /// With a `bbox` the tile is first cut to the survey area on its own
    /// pixels. Pixel spacing comes from `pixel_scale` when given, otherwise
    /// from the tile's georeference.
    pub fn topography(
        &mut self,
        source: &dyn RasterSource,
        pixel_scale: Option<PixelScale>,
        bbox: Option<&BoundingBox>,
    ) -> Result<TopographyResult> {
        let mut raster = source.load()?;
        if let Some(bbox) = bbox {
            raster = crop_to_bbox(&raster, source.label_bounds().as_ref(), bbox)?;
            info!(scene = %source.id(), width = raster.width, height = raster.height, "Cropped elevation tile");
        }
        let (dx_m, dy_m) = match pixel_scale {
            Some(s) => (s.meters_per_pixel, s.meters_per_pixel),
            None => spacing_from_georeference(&raster, source)?,
        };
        let dem = raster
            .bands
            .first()
            .ok_or_else(|| PipelineError::invalid_scene(source.id(), "no elevation band"))?
            .rescaled();
        let (w, h) = (raster.width, raster.height);

        let key = stage_key(
            "topography",
            &[
                source.id().to_string(),
                format!("{w}x{h} {:?}", raster.transform),
                format!("{:016x}{:016x}", dx_m.to_bits(), dy_m.to_bits()),
            ],
        );
        let slope = self
            .cache
            .get_or_compute(key, || Ok(terrain_mosaic("avg_slope", slope_degrees(&dem, w, h, dx_m, dy_m)?, w, h)))?;
        let roughness = terrain_mosaic("avg_roughness", roughness_std(&dem, w, h)?, w, h);
        let tri = terrain_mosaic("avg_tri", terrain_ruggedness_index(&dem, w, h)?, w, h);

        let slope_range = slope.value_range();
        info!(
            scene = %source.id(),
            dx_m,
            dy_m,
            valid = slope.valid_count(),
            "Terrain derivatives computed"
        );
        let table = aggregate_cells(&[&slope, &roughness, &tri], self.config.cell_grid())?;

        Ok(TopographyResult {
            table,
            width: w,
            height: h,
            dx_m,
            dy_m,
            pixel_scale,
            slope_range,
        })
    }

    fn survey_grid(&self, bbox: &BoundingBox) -> Result<GridSpec> {
        let grid = GridSpec::from_geographic_bbox(bbox, self.config.grid.target_resolution_m, self.config.grid.max_pixels)?;
        info!(
            width = grid.width,
            height = grid.height,
            resolution_m = grid.resolution,
            "Survey grid"
        );
        Ok(grid)
    }

    fn mosaic_key(&self, stage: &str, band: &str, reducer: Reducer, grid: &GridSpec, ids: &[&str]) -> StageKey {
        let mut parts = vec![
            band.to_string(),
            reducer.to_string(),
            self.config.grid.interpolation.to_string(),
            format!("{}x{} {:?}", grid.width, grid.height, grid.transform),
            format!("{:016x}", self.config.grid.footprint_epsilon.to_bits()),
        ];
        parts.extend(ids.iter().map(|s| s.to_string()));
        stage_key(stage, &parts)
    }
}

fn reproject_thermal(
    reprojector: &Reprojector<'_>,
    src: &dyn RasterSource,
    default_nodata: f64,
) -> std::result::Result<Vec<f32>, SkippedScene> {
    let mut raster = src.load().map_err(|e| SkippedScene::new(src.id(), e))?;
    if raster.nodata.is_none() {
        raster = raster.with_nodata(default_nodata);
    }
    let label = src.label_bounds();
    reprojector
        .reproject_bands(&raster, &[0], label.as_ref())
        .map(|mut bands| bands.swap_remove(0))
        .map_err(|e| SkippedScene::new(src.id(), e))
}

fn terrain_mosaic(name: &str, data: Vec<f32>, width: usize, height: usize) -> Mosaic {
    let coverage = data.iter().map(|v| u32::from(v.is_finite())).collect();
    Mosaic {
        band: name.to_string(),
        width,
        height,
        data,
        coverage,
    }
}

/// Pixel spacing in meters from the tile's own placement.
fn spacing_from_georeference(raster: &Raster, source: &dyn RasterSource) -> Result<(f64, f64)> {
    let georef = grid_processor::Georeference::resolve(raster, source.label_bounds().as_ref())?;
    let t = georef.transform;
    let (px, py) = (t.pixel_width().abs(), t.pixel_height().abs());
    Ok(match georef.crs {
        Crs::MarsEquirectangular { .. } => (px, py),
        Crs::MarsGeographic => {
            let center_lat = t.bounds(raster.width, raster.height).center().1;
            let m_per_deg = MARS_RADIUS_M.to_radians();
            (px * m_per_deg * center_lat.to_radians().cos(), py * m_per_deg)
        }
    })
}

/// Sources from explicit manifest paths plus any found under `scene_dir`.
pub fn load_sources(scenes: &[PathBuf], scene_dir: Option<&PathBuf>) -> Result<Vec<BoxedSource>> {
    let mut manifests = scenes
        .iter()
        .map(SceneManifest::load)
        .collect::<Result<Vec<_>>>()?;
    if let Some(dir) = scene_dir {
        manifests.extend(discover_manifests(dir)?);
    }
    Ok(manifests
        .into_iter()
        .map(|m| Box::new(RawSceneSource::new(m)) as BoxedSource)
        .collect())
}
