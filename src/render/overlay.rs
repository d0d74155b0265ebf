// src/render/overlay.rs
use image::RgbImage;
use rayon::prelude::*;

use crate::error::Result;
use crate::raster::{Raster, VegetationMask};

/// Composite `color` at `alpha / 255` opacity over every masked pixel of
/// `raster`. Unmasked pixels keep their original colour.
pub fn render_overlay(raster: &Raster, mask: &VegetationMask, color: [u8; 3], alpha: u8) -> Result<RgbImage> {
    let mut buffer = raster.to_rgb8();

    buffer
        .par_chunks_exact_mut(3)
        .zip(mask.cells().par_iter())
        .filter(|&(_, &selected)| selected)
        .for_each(|(px, _)| {
            for (dst, &src) in px.iter_mut().zip(color.iter()) {
                *dst = blend(src, *dst, alpha);
            }
        });

    super::to_image("overlay", raster.width(), raster.height(), buffer)
}

/// Source-over blend of one channel onto an opaque destination.
fn blend(src: u8, dst: u8, alpha: u8) -> u8 {
    let a = alpha as u16;
    ((src as u16 * a + dst as u16 * (255 - a) + 127) / 255) as u8
}
