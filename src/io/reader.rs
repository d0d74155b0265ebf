// src/io/reader.rs
use image::ImageReader;
use log::debug;
use std::path::Path;

use crate::error::{AnalysisError, Result};
use crate::raster::Raster;

/// Decode an image file into a normalized RGB raster.
///
/// Any format the `image` crate can sniff is accepted; grey and RGBA
/// inputs are converted to RGB. With the `gdal` feature, files it cannot
/// decode are retried through GDAL.
pub fn load_rgb<P: AsRef<Path>>(path: P) -> Result<Raster> {
    let path = path.as_ref();
    let decoded = decode(path);

    #[cfg(feature = "gdal")]
    let decoded = decoded.or_else(|err| {
        debug!("image decode failed ({err}), retrying {} with GDAL", path.display());
        gdal_reader::read_rgb(path).map_err(|_| err)
    });

    let raster = decoded?;
    debug!(
        "Loaded {} ({}x{})",
        path.display(),
        raster.width(),
        raster.height()
    );
    Ok(raster)
}

fn decode(path: &Path) -> Result<Raster> {
    let image = ImageReader::open(path)
        .map_err(|e| AnalysisError::image_load(path, e))?
        .with_guessed_format()
        .map_err(|e| AnalysisError::image_load(path, e))?
        .decode()
        .map_err(|e| AnalysisError::image_load(path, e))?;

    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    Raster::from_rgb8(width as usize, height as usize, rgb.as_raw())
        .map_err(|e| AnalysisError::image_load(path, e))
}

#[cfg(feature = "gdal")]
mod gdal_reader {
    use gdal::Dataset;
    use std::path::Path;

    use crate::error::{AnalysisError, Result};
    use crate::raster::Raster;

    /// Bands 1-3 are read as RGB; with fewer than three bands the first one
    /// is used as grey.
    pub fn read_rgb(path: &Path) -> Result<Raster> {
        let dataset = Dataset::open(path).map_err(|e| AnalysisError::image_load(path, e))?;
        let (width, height) = dataset.raster_size();
        let band_count = dataset.raster_count();
        if band_count == 0 {
            return Err(AnalysisError::image_load(path, "dataset has no raster bands"));
        }

        let channels = if band_count >= 3 { 3 } else { 1 };
        let mut bands = Vec::with_capacity(channels);
        for index in 1..=channels {
            let band = dataset
                .rasterband(index)
                .map_err(|e| AnalysisError::image_load(path, e))?;
            let buffer = band
                .read_as::<u8>((0, 0), (width, height), (width, height), None)
                .map_err(|e| AnalysisError::image_load(path, e))?;
            bands.push(buffer);
        }

        let mut rgb = Vec::with_capacity(width * height * 3);
        for i in 0..width * height {
            for c in 0..3 {
                rgb.push(bands[c.min(bands.len() - 1)].data()[i]);
            }
        }

        Raster::from_rgb8(width, height, &rgb).map_err(|e| AnalysisError::image_load(path, e))
    }
}
