// src/processing/indices/mod.rs
pub mod exg;
pub mod vari;

// Re-export indices
pub use exg::ExG;
pub use vari::VARI;

use crate::raster::{IndexMap, Raster};

/// Guards the index denominators and the normalization range.
pub const EPSILON: f32 = 1e-6;

/// A colour index computed over a whole RGB raster.
pub trait IndexCalculator: Send + Sync {
    /// Calculate the index, normalized to [0, 1]
    fn calculate(&self, raster: &Raster) -> IndexMap;

    /// Return the name of the index
    fn name(&self) -> &str;
}
