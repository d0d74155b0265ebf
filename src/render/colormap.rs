// src/render/colormap.rs
//! Fixed colour ramps with multi-stop linear interpolation.

use image::RgbImage;
use rayon::prelude::*;

use crate::error::Result;
use crate::raster::IndexMap;

/// A colour stop: position in [0, 1] mapped to an RGB colour.
#[derive(Debug, Clone, Copy)]
pub struct ColorStop {
    pub t: f32,
    pub color: [u8; 3],
}

impl ColorStop {
    pub const fn new(t: f32, r: u8, g: u8, b: u8) -> Self {
        Self { t, color: [r, g, b] }
    }
}

/// Available colour ramps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorRamp {
    /// Red -> Yellow -> Green (diverging, ExG heatmap)
    RdYlGn,
    /// Purple -> Teal -> Yellow (perceptually uniform, VARI heatmap)
    Viridis,
}

// ColorBrewer RdYlGn, 11 classes
const RDYLGN_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 165, 0, 38),
    ColorStop::new(0.1, 215, 48, 39),
    ColorStop::new(0.2, 244, 109, 67),
    ColorStop::new(0.3, 253, 174, 97),
    ColorStop::new(0.4, 254, 224, 139),
    ColorStop::new(0.5, 255, 255, 191),
    ColorStop::new(0.6, 217, 239, 139),
    ColorStop::new(0.7, 166, 217, 106),
    ColorStop::new(0.8, 102, 189, 99),
    ColorStop::new(0.9, 26, 152, 80),
    ColorStop::new(1.0, 0, 104, 55),
];

const VIRIDIS_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 68, 1, 84),
    ColorStop::new(0.125, 71, 45, 123),
    ColorStop::new(0.25, 59, 82, 139),
    ColorStop::new(0.375, 44, 114, 142),
    ColorStop::new(0.5, 33, 145, 140),
    ColorStop::new(0.625, 40, 174, 128),
    ColorStop::new(0.75, 94, 201, 98),
    ColorStop::new(0.875, 173, 220, 48),
    ColorStop::new(1.0, 253, 231, 37),
];

impl ColorRamp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RdYlGn => "RdYlGn",
            Self::Viridis => "viridis",
        }
    }

    pub fn stops(&self) -> &'static [ColorStop] {
        match self {
            Self::RdYlGn => RDYLGN_STOPS,
            Self::Viridis => VIRIDIS_STOPS,
        }
    }

    /// Colour at `t`. Values outside [0, 1] are clamped; non-finite values
    /// map to the start of the ramp.
    pub fn evaluate(&self, t: f32) -> [u8; 3] {
        let stops = self.stops();
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };

        for pair in stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.t {
                let span = b.t - a.t;
                let f = if span > 0.0 { (t - a.t) / span } else { 0.0 };
                return lerp(a.color, b.color, f);
            }
        }

        stops[stops.len() - 1].color
    }
}

fn lerp(a: [u8; 3], b: [u8; 3], f: f32) -> [u8; 3] {
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * f).round().clamp(0.0, 255.0) as u8;
    [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])]
}

/// Render an index grid as a false-colour image, one pixel per cell.
pub fn render_heatmap(map: &IndexMap, ramp: ColorRamp) -> Result<RgbImage> {
    let mut buffer = vec![0u8; map.values().len() * 3];

    buffer
        .par_chunks_exact_mut(3)
        .zip(map.values().par_iter())
        .for_each(|(px, &v)| px.copy_from_slice(&ramp.evaluate(v)));

    super::to_image(map.name(), map.width(), map.height(), buffer)
}
