// src/processing/indices/vari.rs
use crate::processing::indices::{IndexCalculator, EPSILON};
use crate::processing::stats;
use crate::raster::{IndexMap, Raster};
use rayon::prelude::*;

pub const DEFAULT_LOWER_PERCENTILE: f64 = 2.0;
pub const DEFAULT_UPPER_PERCENTILE: f64 = 98.0;

/// VARI for one pixel: `(G - R) / (G + R - B + eps)`.
/// Non-finite results (NaN, ±inf) are replaced with 0.
pub fn vari_value(r: f32, g: f32, b: f32) -> f32 {
    let v = (g - r) / (g + r - b + EPSILON);
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Visible Atmospherically Resistant Index (VARI) calculator
///
/// Values are clipped to the image's [lower, upper] percentile range and
/// rescaled to [0, 1], discarding hot and dark outliers. A flat grid (every
/// pixel equal) has no range at all; its raw values are clipped into [0, 1]
/// directly. A grid whose percentiles coincide but which is not flat maps
/// to 0 everywhere.
pub struct VARI {
    lower_percentile: f64,
    upper_percentile: f64,
    name: String,
}

impl VARI {
    pub fn new(name: Option<String>) -> Self {
        Self {
            lower_percentile: DEFAULT_LOWER_PERCENTILE,
            upper_percentile: DEFAULT_UPPER_PERCENTILE,
            name: name.unwrap_or_else(|| "VARI".to_string()),
        }
    }

    pub fn with_percentiles(mut self, lower: f64, upper: f64) -> Self {
        self.lower_percentile = lower.min(upper);
        self.upper_percentile = lower.max(upper);
        self
    }

    pub fn percentiles(&self) -> (f64, f64) {
        (self.lower_percentile, self.upper_percentile)
    }
}

impl Default for VARI {
    fn default() -> Self {
        Self::new(None)
    }
}

impl IndexCalculator for VARI {
    fn calculate(&self, raster: &Raster) -> IndexMap {
        let raw: Vec<f32> = raster
            .channels()
            .par_chunks_exact(3)
            .map(|p| vari_value(p[0], p[1], p[2]))
            .collect();

        let (min, max) = stats::min_max(&raw);
        let values = if max > min {
            let (lo, hi) = stats::percentile_range(&raw, self.lower_percentile, self.upper_percentile);
            let scale = (hi - lo) + EPSILON;
            raw.par_iter()
                .map(|&v| ((v.clamp(lo, hi) - lo) / scale).clamp(0.0, 1.0))
                .collect()
        } else {
            raw.par_iter().map(|&v| v.clamp(0.0, 1.0)).collect()
        };

        IndexMap::from_parts(self.name.clone(), raster.width(), raster.height(), values)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
