// src/io/writer.rs
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageError, RgbImage};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{AnalysisError, Result};

/// Eight lowercase hex characters taken from a fresh UUID v4.
pub fn random_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

/// `<dir>/<prefix>_<id>.png`
pub fn artifact_name(dir: &Path, prefix: &str, id: &str) -> PathBuf {
    dir.join(format!("{prefix}_{id}.png"))
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| AnalysisError::file_system(dir, e))
}

/// Encode `image` as PNG straight into `path`.
pub fn write_png(image: &RgbImage, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| AnalysisError::file_system(path, e))?;
    let mut out = BufWriter::new(file);

    PngEncoder::new(&mut out)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| match e {
            ImageError::IoError(source) => AnalysisError::file_system(path, source),
            other => AnalysisError::Render {
                artifact: path.display().to_string(),
                reason: other.to_string(),
            },
        })?;

    out.flush().map_err(|e| AnalysisError::file_system(path, e))
}
