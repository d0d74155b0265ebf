// src/report.rs
//! Report metadata handed to the document generator.
//!
//! Document layout is done elsewhere; this module only produces the
//! metadata record, its JSON sidecar file and a registry of recent reports.

use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{AnalysisError, Result};
use crate::processing::Metrics;
use crate::utils::cache::{Clock, SystemClock, TtlCache};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    pub report_id: String,
    pub original_filename: String,
    pub plot_name: Option<String>,
    pub metrics: Metrics,
    pub user_id: Option<i64>,
}

impl ReportMeta {
    pub fn new(
        report_id: String,
        original_filename: String,
        plot_name: Option<String>,
        metrics: Metrics,
        user_id: Option<i64>,
    ) -> Self {
        Self {
            report_id,
            original_filename,
            plot_name,
            metrics,
            user_id,
        }
    }

    /// Metadata for an analysis of `image_path` under a fresh report id.
    pub fn for_analysis(image_path: &Path, plot_name: Option<String>, metrics: &Metrics) -> Self {
        let original_filename = image_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self::new(
            Uuid::new_v4().simple().to_string(),
            original_filename,
            plot_name,
            *metrics,
            None,
        )
    }
}

/// `report.pdf` -> `report.json`
pub fn sidecar_path(report_path: &Path) -> PathBuf {
    report_path.with_extension("json")
}

/// Write `meta` as JSON next to `report_path` and return the sidecar path.
pub fn write_sidecar(report_path: &Path, meta: &ReportMeta) -> Result<PathBuf> {
    let path = sidecar_path(report_path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| AnalysisError::file_system(parent, e))?;
    }

    let json = serde_json::to_vec_pretty(meta)?;
    fs::write(&path, json).map_err(|e| AnalysisError::file_system(&path, e))?;

    debug!("Wrote report metadata {}", path.display());
    Ok(path)
}

pub fn read_sidecar(path: &Path) -> Result<ReportMeta> {
    let json = fs::read(path).map_err(|e| AnalysisError::file_system(path, e))?;
    Ok(serde_json::from_slice(&json)?)
}

const KEY_PREFIX: &str = "report:";

/// Recent reports by id, kept in an injected cache.
pub struct ReportRegistry<C: Clock = SystemClock> {
    cache: Arc<TtlCache<ReportMeta, C>>,
    ttl: Duration,
}

impl<C: Clock> ReportRegistry<C> {
    pub fn new(cache: Arc<TtlCache<ReportMeta, C>>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    pub fn register(&self, meta: ReportMeta) {
        self.cache
            .set(format!("{KEY_PREFIX}{}", meta.report_id), meta, self.ttl);
    }

    pub fn get(&self, report_id: &str) -> Option<ReportMeta> {
        self.cache.get(&format!("{KEY_PREFIX}{report_id}"))
    }

    /// Metadata of `report_id`. On a cache miss the sidecar next to
    /// `report_path` is read and registered again.
    pub fn lookup(&self, report_id: &str, report_path: &Path) -> Result<ReportMeta> {
        if let Some(meta) = self.get(report_id) {
            return Ok(meta);
        }

        let path = sidecar_path(report_path);
        let meta = read_sidecar(&path)?;
        if meta.report_id != report_id {
            return Err(AnalysisError::file_system(
                &path,
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("sidecar belongs to report {}, not {report_id}", meta.report_id),
                ),
            ));
        }

        debug!("Restored report {report_id} from {}", path.display());
        self.register(meta.clone());
        Ok(meta)
    }

    pub fn forget(&self, report_id: &str) -> Option<ReportMeta> {
        self.cache.remove(&format!("{KEY_PREFIX}{report_id}"))
    }

    /// Drop every report, leaving other keys in a shared cache alone.
    pub fn clear(&self) {
        self.cache.remove_by_prefix(KEY_PREFIX);
    }
}
