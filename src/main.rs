// src/main.rs
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::sync::Arc;

use vegemap::batch::{process_batch, BatchOverrides};
use vegemap::cli::{Cli, Commands};
use vegemap::processing::{Analysis, AnalysisParams, VegetationAnalyzer};
use vegemap::report::ReportRegistry;
use vegemap::utils::cache::{TtlCache, DEFAULT_TTL};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match &cli.command {
        Commands::Analyze { image, output_dir, json } => {
            let mut params = AnalysisParams::default();
            if let Some(threshold) = cli.threshold {
                params = params.with_threshold(threshold);
            }

            let analysis = VegetationAnalyzer::with_params(params)
                .analyze(image, output_dir)
                .with_context(|| format!("Analysis failed for {}", image.display()))?;

            if *json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                print_analysis(&analysis);
            }
        }
        Commands::Batch { config, jobs } => {
            let registry = ReportRegistry::new(Arc::new(TtlCache::new()), DEFAULT_TTL);
            let summary = process_batch(
                config,
                BatchOverrides {
                    jobs: *jobs,
                    threshold: cli.threshold,
                },
                &registry,
            )?;

            for done in &summary.completed {
                println!(
                    "{}: health {:.1}, coverage {:.2}%",
                    done.image.display(),
                    done.analysis.metrics.health_score,
                    done.analysis.metrics.vegetation_coverage_percent
                );
                if let (Some(report_id), Some(sidecar)) = (&done.report_id, &done.sidecar) {
                    println!("  report {} -> {}", report_id, sidecar.display());
                }
            }
            if !summary.is_success() {
                for (image, e) in &summary.failed {
                    eprintln!("{}: {}", image.display(), e);
                }
                bail!("{} of {} analyses failed", summary.failed.len(), summary.failed.len() + summary.completed.len());
            }
        }
    }

    Ok(())
}

fn print_analysis(analysis: &Analysis) {
    let m = &analysis.metrics;
    println!("Vegetation coverage: {:.2}%", m.vegetation_coverage_percent);
    println!("ExG mean:            {:.4}", m.exg_mean);
    println!("VARI mean:           {:.4}", m.vari_mean);
    println!("Health score:        {:.1}", m.health_score);

    for finding in m.findings() {
        println!("  - {}", finding.message());
    }

    println!("ExG heatmap:  {}", analysis.assets.heat_exg.display());
    println!("VARI heatmap: {}", analysis.assets.heat_vari.display());
    println!("Overlay:      {}", analysis.assets.overlay.display());
}
