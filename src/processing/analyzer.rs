// src/processing/analyzer.rs
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::io::{self, reader, writer};
use crate::processing::indices::{ExG, IndexCalculator, VARI};
use crate::processing::metrics::{Metrics, ScoreWeights};
use crate::raster::{IndexMap, Raster, VegetationMask};
use crate::render::{self, ColorRamp};

/// Tunables of the pipeline. The defaults are the fixed values every
/// analysis uses unless a caller explicitly overrides them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    /// Normalized ExG above which a pixel counts as vegetation.
    pub mask_threshold: f32,
    pub vari_lower_percentile: f64,
    pub vari_upper_percentile: f64,
    pub weights: ScoreWeights,
    pub overlay_color: [u8; 3],
    /// Overlay opacity out of 255.
    pub overlay_alpha: u8,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            mask_threshold: 0.15,
            vari_lower_percentile: 2.0,
            vari_upper_percentile: 98.0,
            weights: ScoreWeights::default(),
            overlay_color: [0, 255, 0],
            overlay_alpha: 100,
        }
    }
}

impl AnalysisParams {
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.mask_threshold = threshold;
        self
    }
}

/// Paths of the rendered artifacts. The caller owns the files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assets {
    pub heat_exg: PathBuf,
    pub heat_vari: PathBuf,
    pub overlay: PathBuf,
}

impl Assets {
    pub fn in_dir(dir: &Path, id: &str) -> Self {
        Self {
            heat_exg: writer::artifact_name(dir, "exg", id),
            heat_vari: writer::artifact_name(dir, "vari", id),
            overlay: writer::artifact_name(dir, "overlay", id),
        }
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        [&self.heat_exg, &self.heat_vari, &self.overlay]
            .into_iter()
            .map(PathBuf::as_path)
    }

    /// Delete whichever artifacts exist. Failures are logged, not returned.
    pub fn remove_all(&self) {
        for path in self.paths().filter(|p| p.exists()) {
            if let Err(e) = fs::remove_file(path) {
                warn!("Could not remove {}: {}", path.display(), e);
            }
        }
    }
}

/// Metrics and artifacts of one successful analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub metrics: Metrics,
    pub assets: Assets,
}

/// In-memory products of the numeric stage.
#[derive(Debug, Clone)]
pub struct IndexSet {
    pub exg: IndexMap,
    pub vari: IndexMap,
    pub mask: VegetationMask,
    pub metrics: Metrics,
}

/// Stateless ExG/VARI analysis of a single RGB image.
///
/// Calls are independent and may run on parallel threads as long as each
/// is given an output directory it may write to. Artifact names carry a
/// random id, so two calls sharing a directory do not overwrite each other.
pub struct VegetationAnalyzer {
    params: AnalysisParams,
    exg: ExG,
    vari: VARI,
}

impl Default for VegetationAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl VegetationAnalyzer {
    pub fn new() -> Self {
        Self::with_params(AnalysisParams::default())
    }

    pub fn with_params(params: AnalysisParams) -> Self {
        Self {
            params,
            exg: ExG::default(),
            vari: VARI::default()
                .with_percentiles(params.vari_lower_percentile, params.vari_upper_percentile),
        }
    }

    pub fn params(&self) -> &AnalysisParams {
        &self.params
    }

    /// Compute the index grids, mask and metrics without touching disk.
    pub fn analyze_raster(&self, raster: &Raster) -> IndexSet {
        let exg = self.exg.calculate(raster);
        let vari = self.vari.calculate(raster);
        let mask = VegetationMask::from_threshold(&exg, self.params.mask_threshold);
        debug!(
            "{} of {} pixels above ExG threshold {}",
            mask.count(),
            raster.len(),
            self.params.mask_threshold
        );

        let metrics = Metrics::compute(&exg, &vari, &mask, self.params.weights);

        IndexSet {
            exg,
            vari,
            mask,
            metrics,
        }
    }

    /// Load `image_path`, analyse it and write the three artifacts into
    /// `output_dir` (created if absent).
    ///
    /// Either everything succeeds or nothing is returned: artifacts written
    /// before a failure are removed again.
    pub fn analyze<P: AsRef<Path>, Q: AsRef<Path>>(&self, image_path: P, output_dir: Q) -> Result<Analysis> {
        let image_path = image_path.as_ref();
        let output_dir = output_dir.as_ref();

        let raster = reader::load_rgb(image_path)?;
        let set = self.analyze_raster(&raster);

        io::ensure_dir(output_dir)?;
        let assets = Assets::in_dir(output_dir, &writer::random_id());

        if let Err(e) = self.render_assets(&raster, &set, &assets) {
            assets.remove_all();
            return Err(e);
        }

        let metrics = set.metrics;
        info!(
            "Analyzed {}: coverage {:.2}%, ExG mean {:.3}, VARI mean {:.3}, health {:.1}",
            image_path.display(),
            metrics.vegetation_coverage_percent,
            metrics.exg_mean,
            metrics.vari_mean,
            metrics.health_score
        );

        Ok(Analysis { metrics, assets })
    }

    fn render_assets(&self, raster: &Raster, set: &IndexSet, assets: &Assets) -> Result<()> {
        let exg = render::render_heatmap(&set.exg, ColorRamp::RdYlGn)?;
        writer::write_png(&exg, &assets.heat_exg)?;

        let vari = render::render_heatmap(&set.vari, ColorRamp::Viridis)?;
        writer::write_png(&vari, &assets.heat_vari)?;

        let overlay = render::render_overlay(
            raster,
            &set.mask,
            self.params.overlay_color,
            self.params.overlay_alpha,
        )?;
        writer::write_png(&overlay, &assets.overlay)?;

        debug!("Wrote artifacts to {}", assets.overlay.parent().unwrap_or(Path::new(".")).display());
        Ok(())
    }
}

/// Analyse one image with the default parameters.
pub fn analyze_image<P: AsRef<Path>, Q: AsRef<Path>>(image_path: P, output_dir: Q) -> Result<Analysis> {
    VegetationAnalyzer::new().analyze(image_path, output_dir)
}
