// src/batch.rs
use anyhow::{Context, Result};
use log::{error, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AnalysisError;
use crate::processing::{Analysis, AnalysisParams, VegetationAnalyzer};
use crate::report::{self, ReportMeta, ReportRegistry};
use crate::utils::cache::Clock;

#[derive(Deserialize, Serialize, Debug)]
pub struct BatchConfig {
    #[serde(default)]
    pub global: GlobalParams,
    pub operations: Vec<Operation>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct GlobalParams {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub params: AnalysisParams,
    /// Worker threads; defaults to the number of CPUs.
    #[serde(default)]
    pub jobs: Option<usize>,
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            params: AnalysisParams::default(),
            jobs: None,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports/tmp")
}

#[derive(Deserialize, Serialize, Debug)]
pub struct Operation {
    pub image: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub plot_name: Option<String>,
    /// Report document path; its JSON metadata sidecar is written next to it.
    pub report: Option<PathBuf>,
    pub threshold: Option<f32>,
}

/// Overrides taken from the command line.
#[derive(Debug, Default, Clone, Copy)]
pub struct BatchOverrides {
    pub jobs: Option<usize>,
    pub threshold: Option<f32>,
}

#[derive(Debug)]
pub struct Completed {
    pub image: PathBuf,
    pub analysis: Analysis,
    pub sidecar: Option<PathBuf>,
    /// Id under which the report was registered, when one was written.
    pub report_id: Option<String>,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub completed: Vec<Completed>,
    pub failed: Vec<(PathBuf, AnalysisError)>,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub fn load_config(config_path: &Path) -> Result<BatchConfig> {
    let config_content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read batch config {}", config_path.display()))?;
    let config: BatchConfig = serde_json::from_str(&config_content)
        .with_context(|| format!("Invalid batch config {}", config_path.display()))?;
    Ok(config)
}

/// Run every operation of the config. A failing operation does not stop the
/// others; failures are collected in the summary in config order.
///
/// Every report whose sidecar was written is also put into `registry`.
pub fn process_batch<C: Clock>(
    config_path: &Path,
    overrides: BatchOverrides,
    registry: &ReportRegistry<C>,
) -> Result<BatchSummary> {
    let mut config = load_config(config_path)?;
    if let Some(threshold) = overrides.threshold {
        config.global.params.mask_threshold = threshold;
    }

    let jobs = overrides
        .jobs
        .or(config.global.jobs)
        .unwrap_or_else(num_cpus::get)
        .max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("Failed to build batch worker pool")?;

    let total = config.operations.len();
    info!("Starting batch processing with {total} operations on {jobs} workers...");

    let (tx, rx) = flume::unbounded();
    let operations = &config.operations;
    let global = &config.global;
    let pool = &pool;

    let mut outcomes = std::thread::scope(|scope| {
        scope.spawn(move || {
            pool.install(|| {
                operations
                    .par_iter()
                    .enumerate()
                    .for_each_with(tx, |tx, (i, op)| {
                        // The receiver outlives every sender
                        let _ = tx.send((i, run_operation(op, global, registry)));
                    })
            })
        });

        let mut outcomes = Vec::with_capacity(total);
        for (done, (i, outcome)) in rx.iter().enumerate() {
            let image = &operations[i].image;
            match &outcome {
                Ok(_) => info!("[{}/{}] {} done", done + 1, total, image.display()),
                Err(e) => error!("[{}/{}] {} failed: {}", done + 1, total, image.display(), e),
            }
            outcomes.push((i, outcome));
        }
        outcomes
    });
    outcomes.sort_by_key(|(i, _)| *i);

    let mut summary = BatchSummary::default();
    for (i, outcome) in outcomes {
        let image = config.operations[i].image.clone();
        match outcome {
            Ok((analysis, report)) => {
                let (sidecar, report_id) = report.unzip();
                summary.completed.push(Completed {
                    image,
                    analysis,
                    sidecar,
                    report_id,
                })
            }
            Err(e) => summary.failed.push((image, e)),
        }
    }

    info!(
        "Batch processing complete: {} succeeded, {} failed",
        summary.completed.len(),
        summary.failed.len()
    );
    Ok(summary)
}

type OperationOutput = (Analysis, Option<(PathBuf, String)>);

fn run_operation<C: Clock>(
    op: &Operation,
    global: &GlobalParams,
    registry: &ReportRegistry<C>,
) -> Result<OperationOutput, AnalysisError> {
    let mut params = global.params;
    if let Some(threshold) = op.threshold {
        params.mask_threshold = threshold;
    }
    let output_dir = op.output_dir.as_deref().unwrap_or(&global.output_dir);

    let analysis = VegetationAnalyzer::with_params(params).analyze(&op.image, output_dir)?;

    let report = match &op.report {
        Some(report_path) => {
            let meta = ReportMeta::for_analysis(&op.image, op.plot_name.clone(), &analysis.metrics);
            match report::write_sidecar(report_path, &meta) {
                Ok(path) => {
                    let report_id = meta.report_id.clone();
                    registry.register(meta);
                    Some((path, report_id))
                }
                Err(e) => {
                    // The analysis is void if its report metadata is missing
                    analysis.assets.remove_all();
                    return Err(e);
                }
            }
        }
        None => None,
    };

    Ok((analysis, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    use crate::utils::cache::TtlCache;

    fn registry() -> ReportRegistry {
        ReportRegistry::new(Arc::new(TtlCache::new()), Duration::from_secs(60))
    }

    fn write_config(dir: &Path, json: &str) -> PathBuf {
        let path = dir.join("batch.json");
        fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn config_defaults_apply() {
        let config: BatchConfig =
            serde_json::from_str(r#"{ "operations": [ { "image": "a.png" } ] }"#).unwrap();

        assert_eq!(config.global.output_dir, PathBuf::from("reports/tmp"));
        assert_eq!(config.global.params, AnalysisParams::default());
        assert!(config.operations[0].report.is_none());
    }

    #[test]
    fn continues_past_failures_and_writes_sidecars() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("field.png");
        RgbImage::from_pixel(4, 4, Rgb([0, 255, 0])).save(&image).unwrap();

        let out = dir.path().join("out");
        let report = dir.path().join("reports").join("report_a.pdf");
        let json = serde_json::json!({
            "global": { "output_dir": out, "jobs": 2 },
            "operations": [
                { "image": image, "plot_name": "north", "report": report },
                { "image": dir.path().join("missing.png") }
            ]
        });
        let config = write_config(dir.path(), &json.to_string());

        let registry = registry();
        let summary = process_batch(&config, BatchOverrides::default(), &registry).unwrap();

        assert!(!summary.is_success());
        assert_eq!(summary.completed.len(), 1);
        assert_eq!(summary.failed.len(), 1);
        assert!(matches!(summary.failed[0].1, AnalysisError::ImageLoad { .. }));

        let done = &summary.completed[0];
        assert_eq!(done.image, image);
        assert!(done.analysis.assets.overlay.starts_with(&out));
        let sidecar = done.sidecar.as_ref().unwrap();
        let meta = report::read_sidecar(sidecar).unwrap();
        assert_eq!(meta.plot_name.as_deref(), Some("north"));
        assert_eq!(meta.metrics, done.analysis.metrics);

        let report_id = done.report_id.as_deref().unwrap();
        assert_eq!(meta.report_id, report_id);
        assert_eq!(registry.get(report_id), Some(meta.clone()));
        assert_eq!(registry.lookup(report_id, &report).unwrap(), meta);
    }

    #[test]
    fn failed_sidecar_removes_written_artifacts() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("field.png");
        RgbImage::from_pixel(4, 4, Rgb([0, 255, 0])).save(&image).unwrap();

        // The sidecar directory cannot be created under a regular file
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"").unwrap();
        let out = dir.path().join("out");
        let json = serde_json::json!({
            "global": { "output_dir": out },
            "operations": [ { "image": image, "report": blocker.join("report.pdf") } ]
        });
        let config = write_config(dir.path(), &json.to_string());

        let registry = registry();
        let summary = process_batch(&config, BatchOverrides::default(), &registry).unwrap();

        assert!(summary.completed.is_empty());
        assert!(matches!(summary.failed[0].1, AnalysisError::FileSystem { .. }));
        assert!(out.is_dir());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn cli_threshold_overrides_config() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("pale.png");
        // Raw ExG of about 0.1 everywhere: between the two thresholds
        RgbImage::from_pixel(2, 2, Rgb([115, 128, 115])).save(&image).unwrap();
        let json = serde_json::json!({
            "global": { "output_dir": dir.path().join("out") },
            "operations": [ { "image": image } ]
        });
        let config = write_config(dir.path(), &json.to_string());

        let strict = process_batch(&config, BatchOverrides::default(), &registry()).unwrap();
        let relaxed = process_batch(
            &config,
            BatchOverrides {
                jobs: Some(1),
                threshold: Some(0.05),
            },
            &registry(),
        )
        .unwrap();

        assert_eq!(strict.completed[0].analysis.metrics.vegetation_coverage_percent, 0.0);
        assert_eq!(relaxed.completed[0].analysis.metrics.vegetation_coverage_percent, 100.0);
    }

    #[test]
    fn unreadable_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(process_batch(&dir.path().join("nope.json"), BatchOverrides::default(), &registry()).is_err());

        let config = write_config(dir.path(), "{ not json");
        assert!(process_batch(&config, BatchOverrides::default(), &registry()).is_err());
    }
}
