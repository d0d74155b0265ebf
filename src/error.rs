// src/error.rs
//! Error types for vegetation analysis

use std::path::PathBuf;

use thiserror::Error;

/// Boxed cause of an image decode failure (`image`, GDAL or raster validation).
pub type LoadCause = Box<dyn std::error::Error + Send + Sync>;

/// Why an analysis did not complete. Any error means no analysis occurred:
/// callers must not use artifacts from a failed call.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Could not load {} as an RGB image: {source}", .path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: LoadCause,
    },

    #[error("File system error at {}: {source}", .path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render {artifact}: {reason}")]
    Render { artifact: String, reason: String },

    #[error("Metadata serialization error: {0}")]
    Metadata(#[from] serde_json::Error),
}

impl AnalysisError {
    pub(crate) fn image_load(path: impl Into<PathBuf>, source: impl Into<LoadCause>) -> Self {
        Self::ImageLoad {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn file_system(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;
