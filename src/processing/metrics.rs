// src/processing/metrics.rs
use serde::{Deserialize, Serialize};

use crate::raster::{IndexMap, VegetationMask};

/// Aggregate results of one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Share of the frame classified as vegetation, in [0, 100].
    pub vegetation_coverage_percent: f64,
    /// Mean normalized ExG over vegetation pixels (0 if there are none).
    pub exg_mean: f64,
    /// Mean normalized VARI over vegetation pixels (0 if there are none).
    pub vari_mean: f64,
    /// Composite score in [0, 100].
    pub health_score: f64,
}

/// Weights of the composite health score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// How green the detected vegetation is.
    pub greenness: f64,
    /// How much of the frame is vegetation.
    pub coverage: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            greenness: 0.7,
            coverage: 0.3,
        }
    }
}

impl Metrics {
    pub fn compute(exg: &IndexMap, vari: &IndexMap, mask: &VegetationMask, weights: ScoreWeights) -> Self {
        let vegetation_coverage_percent = 100.0 * mask.coverage_fraction();

        // An empty mask means both means are 0 by definition
        let (exg_mean, vari_mean) = if mask.is_empty() {
            (0.0, 0.0)
        } else {
            (exg.mean_where(mask), vari.mean_where(mask))
        };

        let greenness = 100.0 * (0.5 * exg_mean + 0.5 * vari_mean);
        let health_score = (weights.greenness * greenness
            + weights.coverage * vegetation_coverage_percent)
            .clamp(0.0, 100.0);

        Self {
            vegetation_coverage_percent,
            exg_mean,
            vari_mean,
            health_score,
        }
    }

    /// Conclusions a report draws from these numbers.
    pub fn findings(&self) -> Vec<Finding> {
        let mut findings = Vec::new();
        if self.vegetation_coverage_percent < 5.0 {
            findings.push(Finding::LowCoverage);
        }
        if self.vari_mean < 0.2 {
            findings.push(Finding::PossibleStress);
        }
        if self.health_score > 70.0 {
            findings.push(Finding::GoodHealth);
        }
        findings
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finding {
    LowCoverage,
    PossibleStress,
    GoodHealth,
}

impl Finding {
    pub fn message(&self) -> &'static str {
        match self {
            Self::LowCoverage => "Low vegetation coverage detected.",
            Self::PossibleStress => "Low VARI mean, possible plant stress.",
            Self::GoodHealth => "Overall good plant health detected.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(values: Vec<f32>) -> IndexMap {
        IndexMap::new("test", 2, 2, values).unwrap()
    }

    #[test]
    fn blends_greenness_and_coverage() {
        let exg = map(vec![0.1, 0.2, 0.8, 1.0]);
        let vari = map(vec![0.5, 0.5, 0.6, 0.2]);
        let mask = VegetationMask::from_threshold(&exg, 0.15);

        let metrics = Metrics::compute(&exg, &vari, &mask, ScoreWeights::default());

        assert!((metrics.vegetation_coverage_percent - 75.0).abs() < 1e-9);
        assert!((metrics.exg_mean - 2.0 / 3.0).abs() < 1e-6);
        assert!((metrics.vari_mean - 1.3 / 3.0).abs() < 1e-6);
        // score 55, 0.7 * 55 + 0.3 * 75
        assert!((metrics.health_score - 61.0).abs() < 1e-4);
    }

    #[test]
    fn empty_mask_scores_zero() {
        let exg = map(vec![0.0; 4]);
        let vari = map(vec![0.9; 4]);
        let mask = VegetationMask::from_threshold(&exg, 0.15);

        let metrics = Metrics::compute(&exg, &vari, &mask, ScoreWeights::default());

        assert_eq!(metrics.vegetation_coverage_percent, 0.0);
        assert_eq!(metrics.exg_mean, 0.0);
        assert_eq!(metrics.vari_mean, 0.0);
        assert_eq!(metrics.health_score, 0.0);
    }

    #[test]
    fn health_score_is_clipped() {
        let exg = map(vec![1.0; 4]);
        let vari = map(vec![1.0; 4]);
        let mask = VegetationMask::from_threshold(&exg, 0.15);
        let weights = ScoreWeights {
            greenness: 1.0,
            coverage: 1.0,
        };

        let metrics = Metrics::compute(&exg, &vari, &mask, weights);

        assert_eq!(metrics.health_score, 100.0);
    }

    #[test]
    fn findings_follow_thresholds() {
        let poor = Metrics {
            vegetation_coverage_percent: 2.0,
            exg_mean: 0.3,
            vari_mean: 0.1,
            health_score: 20.0,
        };
        assert_eq!(poor.findings(), vec![Finding::LowCoverage, Finding::PossibleStress]);

        let healthy = Metrics {
            vegetation_coverage_percent: 80.0,
            exg_mean: 0.9,
            vari_mean: 0.8,
            health_score: 83.0,
        };
        assert_eq!(healthy.findings(), vec![Finding::GoodHealth]);
    }

    #[test]
    fn serializes_with_external_field_names() {
        let metrics = Metrics {
            vegetation_coverage_percent: 50.0,
            exg_mean: 0.5,
            vari_mean: 0.25,
            health_score: 41.25,
        };
        let json = serde_json::to_value(metrics).unwrap();

        assert_eq!(json["vegetation_coverage_percent"], 50.0);
        assert_eq!(json["exg_mean"], 0.5);
        assert_eq!(json["vari_mean"], 0.25);
        assert_eq!(json["health_score"], 41.25);
    }
}
