// src/processing/mod.rs
pub mod analyzer;
pub mod indices;
pub mod metrics;
pub mod stats;

// Re-export main components
pub use analyzer::{analyze_image, Analysis, AnalysisParams, Assets, IndexSet, VegetationAnalyzer};
pub use metrics::{Finding, Metrics, ScoreWeights};
