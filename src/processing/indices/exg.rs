// src/processing/indices/exg.rs
use crate::processing::indices::{IndexCalculator, EPSILON};
use crate::processing::stats;
use crate::raster::{IndexMap, Raster};
use rayon::prelude::*;

/// Raw Excess Green for one pixel: `2G - R - B`, in [-2, 2].
pub fn exg_value(r: f32, g: f32, b: f32) -> f32 {
    2.0 * g - r - b
}

/// Excess Green (ExG) calculator
///
/// The raw index is shifted so the image minimum becomes 0 and divided by
/// the shifted maximum plus [`EPSILON`]. This is relative to each image:
/// values from two images with different lighting are not comparable.
///
/// A flat grid (maximum equal to minimum) has no range to stretch; its raw
/// values are clipped into [0, 1] instead, so a black frame stays at 0 and
/// a uniformly green one reads as fully green.
pub struct ExG {
    name: String,
}

impl ExG {
    pub fn new(name: Option<String>) -> Self {
        Self {
            name: name.unwrap_or_else(|| "ExG".to_string()),
        }
    }
}

impl Default for ExG {
    fn default() -> Self {
        Self::new(None)
    }
}

impl IndexCalculator for ExG {
    fn calculate(&self, raster: &Raster) -> IndexMap {
        let raw: Vec<f32> = raster
            .channels()
            .par_chunks_exact(3)
            .map(|p| exg_value(p[0], p[1], p[2]))
            .collect();

        let (min, max) = stats::min_max(&raw);
        let range = max - min;

        let values = if range > 0.0 {
            let scale = range + EPSILON;
            raw.par_iter().map(|&v| (v - min) / scale).collect()
        } else {
            raw.par_iter().map(|&v| v.clamp(0.0, 1.0)).collect()
        };

        IndexMap::from_parts(self.name.clone(), raster.width(), raster.height(), values)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
