// src/raster.rs
//! In-memory grids passed between the analysis stages.
//!
//! All grids are row-major and share the width/height of the [`Raster`]
//! they were derived from.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Buffer size mismatch: expected {expected} values, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

fn check_dimensions(width: usize, height: usize) -> Result<usize, RasterError> {
    match width.checked_mul(height) {
        Some(len) if len > 0 => Ok(len),
        _ => Err(RasterError::InvalidDimensions { width, height }),
    }
}

/// RGB raster with channels normalized to [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: usize,
    height: usize,
    // Interleaved r, g, b
    data: Vec<f32>,
}

impl Raster {
    /// Build a raster from interleaved 8-bit RGB samples.
    pub fn from_rgb8(width: usize, height: usize, bytes: &[u8]) -> Result<Self, RasterError> {
        let len = check_dimensions(width, height)?;
        if bytes.len() != len * 3 {
            return Err(RasterError::SizeMismatch {
                expected: len * 3,
                actual: bytes.len(),
            });
        }

        let data = bytes.iter().map(|&b| b as f32 / 255.0).collect();
        Ok(Self { width, height, data })
    }

    /// Build a raster from a per-pixel function returning `[r, g, b]`.
    /// Values are clamped to [0, 1].
    pub fn from_fn<F>(width: usize, height: usize, f: F) -> Result<Self, RasterError>
    where
        F: Fn(usize, usize) -> [f32; 3],
    {
        let len = check_dimensions(width, height)?;
        let mut data = Vec::with_capacity(len * 3);
        for y in 0..height {
            for x in 0..width {
                data.extend(f(x, y).iter().map(|v| v.clamp(0.0, 1.0)));
            }
        }
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pixel(&self, x: usize, y: usize) -> [f32; 3] {
        let i = (y * self.width + x) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    pub fn pixels(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.data.chunks_exact(3).map(|p| [p[0], p[1], p[2]])
    }

    /// Interleaved channel samples.
    pub fn channels(&self) -> &[f32] {
        &self.data
    }

    /// Re-quantize to interleaved 8-bit RGB.
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.data
            .iter()
            .map(|v| (v * 255.0).round().clamp(0.0, 255.0) as u8)
            .collect()
    }
}

/// Scalar index grid (ExG, VARI) normalized to [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMap {
    name: String,
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl IndexMap {
    pub fn new(
        name: impl Into<String>,
        width: usize,
        height: usize,
        values: Vec<f32>,
    ) -> Result<Self, RasterError> {
        let len = check_dimensions(width, height)?;
        if values.len() != len {
            return Err(RasterError::SizeMismatch {
                expected: len,
                actual: values.len(),
            });
        }
        Ok(Self::from_parts(name.into(), width, height, values))
    }

    pub(crate) fn from_parts(name: String, width: usize, height: usize, values: Vec<f32>) -> Self {
        debug_assert_eq!(values.len(), width * height);
        Self {
            name,
            width,
            height,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.width + x]
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Mean of the values under `mask`, or 0 when the mask selects nothing.
    pub fn mean_where(&self, mask: &VegetationMask) -> f64 {
        debug_assert_eq!((self.width, self.height), (mask.width(), mask.height()));

        let (sum, count) = self
            .values
            .iter()
            .zip(mask.cells())
            .filter(|&(_, &selected)| selected)
            .fold((0.0f64, 0usize), |(sum, count), (&v, _)| {
                (sum + v as f64, count + 1)
            });

        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }
}

/// Pixels classified as vegetation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VegetationMask {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl VegetationMask {
    /// `true` wherever `map` is strictly above `threshold`.
    pub fn from_threshold(map: &IndexMap, threshold: f32) -> Self {
        Self {
            width: map.width(),
            height: map.height(),
            cells: map.values().iter().map(|&v| v > threshold).collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        self.cells[y * self.width + x]
    }

    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// Number of vegetation pixels.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Fraction of the frame covered by vegetation, in [0, 1].
    pub fn coverage_fraction(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.count() as f64 / self.cells.len() as f64
    }
}
