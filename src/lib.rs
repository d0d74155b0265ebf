// src/lib.rs
pub mod batch;
pub mod cli;
pub mod error;
pub mod io;
pub mod processing;
pub mod raster;
pub mod render;
pub mod report;
pub mod utils;

pub use error::{AnalysisError, Result};
pub use processing::{analyze_image, Analysis, AnalysisParams, Assets, Metrics, VegetationAnalyzer};
pub use raster::{IndexMap, Raster, VegetationMask};

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
