// tests/pipeline_tests.rs
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vegemap::{analyze_image, AnalysisError, Metrics, Raster, VegetationAnalyzer};

const GREEN: [u8; 3] = [0, 255, 0];
const BROWN: [u8; 3] = [102, 51, 26];

/// Write a PNG fixture where row `y` is filled with `rows(y)`
fn write_fixture(dir: &Path, name: &str, size: u32, rows: impl Fn(u32) -> [u8; 3]) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_fn(size, size, |_, y| Rgb(rows(y)))
        .save(&path)
        .unwrap();
    path
}

fn analyze_rows(rows: impl Fn(u32) -> [u8; 3]) -> Metrics {
    let dir = TempDir::new().unwrap();
    let image = write_fixture(dir.path(), "field.png", 4, rows);
    analyze_image(&image, dir.path().join("out")).unwrap().metrics
}

fn assert_artifact_name(path: &Path, prefix: &str) {
    let name = path.file_name().unwrap().to_str().unwrap();
    let id = name
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|rest| rest.strip_suffix(".png"))
        .unwrap_or_else(|| panic!("unexpected artifact name {name}"));

    assert_eq!(id.len(), 8, "{name}");
    assert!(id.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')), "{name}");
}

#[test]
fn half_green_half_brown_scenario() {
    let mixed = analyze_rows(|y| if y < 2 { GREEN } else { BROWN });
    let all_green = analyze_rows(|_| GREEN);
    let all_brown = analyze_rows(|_| BROWN);

    assert_eq!(mixed.vegetation_coverage_percent, 50.0);
    assert!(mixed.health_score > all_brown.health_score);
    assert!(mixed.health_score < all_green.health_score);

    assert_eq!(all_green.vegetation_coverage_percent, 100.0);
    assert_eq!(all_brown.vegetation_coverage_percent, 0.0);
}

#[test]
fn black_image_scores_zero() {
    let metrics = analyze_rows(|_| [0, 0, 0]);

    assert_eq!(metrics.exg_mean, 0.0);
    assert_eq!(metrics.vari_mean, 0.0);
    assert_eq!(metrics.vegetation_coverage_percent, 0.0);
    assert_eq!(metrics.health_score, 0.0);
}

#[test]
fn writes_three_artifacts_with_random_ids() {
    let dir = TempDir::new().unwrap();
    let image = write_fixture(dir.path(), "field.png", 4, |y| if y % 2 == 0 { GREEN } else { BROWN });
    let out = dir.path().join("nested").join("work");

    let analysis = analyze_image(&image, &out).unwrap();
    let assets = &analysis.assets;

    assert_artifact_name(&assets.heat_exg, "exg");
    assert_artifact_name(&assets.heat_vari, "vari");
    assert_artifact_name(&assets.overlay, "overlay");

    for path in assets.paths() {
        assert_eq!(path.parent().unwrap(), out);
        let decoded = image::open(path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 4));
    }

    // Overlay keeps unmasked pixels and tints masked ones
    let overlay = image::open(&assets.overlay).unwrap().to_rgb8();
    assert_eq!(overlay.get_pixel(0, 1).0, BROWN);
    assert_eq!(overlay.get_pixel(0, 0).0, [0, 255, 0]);
}

#[test]
fn repeated_runs_give_identical_metrics() {
    let dir = TempDir::new().unwrap();
    let image = write_fixture(dir.path(), "field.png", 16, |y| {
        [(y * 13 % 256) as u8, (y * 29 % 256) as u8, (y * 7 % 256) as u8]
    });

    let analyzer = VegetationAnalyzer::new();
    let first = analyzer.analyze(&image, dir.path().join("a")).unwrap();
    let second = analyzer.analyze(&image, dir.path().join("b")).unwrap();

    assert_eq!(first.metrics, second.metrics);
    assert_ne!(
        first.assets.overlay.file_name(),
        second.assets.overlay.file_name()
    );
}

#[test]
fn metrics_stay_in_range() {
    let analyzer = VegetationAnalyzer::new();
    let patterns: [fn(usize, usize) -> [f32; 3]; 4] = [
        |x, y| [x as f32 / 8.0, y as f32 / 8.0, 0.5],
        |x, _| [0.1, (x % 3) as f32 / 2.0, 0.9],
        |_, y| [1.0, 1.0 - y as f32 / 8.0, 0.0],
        |x, y| if (x + y) % 2 == 0 { [0.0, 1.0, 0.0] } else { [1.0, 1.0, 1.0] },
    ];

    for pattern in patterns {
        let raster = Raster::from_fn(8, 8, pattern).unwrap();
        let metrics = analyzer.analyze_raster(&raster).metrics;

        assert!((0.0..=100.0).contains(&metrics.vegetation_coverage_percent));
        assert!((0.0..=100.0).contains(&metrics.health_score));
        assert!((0.0..=1.0).contains(&metrics.exg_mean));
        assert!((0.0..=1.0).contains(&metrics.vari_mean));
    }
}

#[test]
fn undecodable_input_is_an_image_load_error() {
    let dir = TempDir::new().unwrap();
    let bogus = dir.path().join("photo.jpg");
    std::fs::write(&bogus, "plain text").unwrap();
    let out = dir.path().join("out");

    let err = analyze_image(&bogus, &out).unwrap_err();

    assert!(matches!(err, AnalysisError::ImageLoad { .. }));
    assert!(!out.exists());
}

#[test]
fn uncreatable_output_dir_is_a_file_system_error() {
    let dir = TempDir::new().unwrap();
    let image = write_fixture(dir.path(), "field.png", 4, |_| GREEN);
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();

    let err = analyze_image(&image, blocker.join("out")).unwrap_err();

    assert!(matches!(err, AnalysisError::FileSystem { .. }));
}
