// src/render/mod.rs
//! Visual artifacts: false-colour heatmaps and the mask overlay.

pub mod colormap;
pub mod overlay;

pub use colormap::{render_heatmap, ColorRamp};
pub use overlay::render_overlay;

use image::RgbImage;

use crate::error::{AnalysisError, Result};

/// Wrap an interleaved RGB buffer, reporting a size or dimension problem as
/// a render failure of `artifact`.
pub(crate) fn to_image(artifact: &str, width: usize, height: usize, buffer: Vec<u8>) -> Result<RgbImage> {
    let render_error = |reason: String| AnalysisError::Render {
        artifact: artifact.to_string(),
        reason,
    };

    let w = u32::try_from(width).map_err(|_| render_error(format!("width {width} exceeds u32")))?;
    let h = u32::try_from(height).map_err(|_| render_error(format!("height {height} exceeds u32")))?;

    RgbImage::from_raw(w, h, buffer)
        .ok_or_else(|| render_error(format!("pixel buffer does not match {w}x{h}")))
}
