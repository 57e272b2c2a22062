use image::{GrayImage, Luma, Rgb, RgbImage};
use light_analyzer::domain::model::{FindingKind, OutputFormat, RoiRequest};
use light_analyzer::{AnalysisEngine, AnalyzerError, CliConfig, LightLossPipeline, LocalStorage};
use std::path::Path;
use tempfile::TempDir;

/// 60x12 strip whose columns lose 0.2 dB each, on a black frame.
fn write_decay_image(dir: &Path, name: &str) {
    let img = RgbImage::from_fn(80, 20, |x, y| {
        if (10..70).contains(&x) && (4..16).contains(&y) {
            let db = -0.2 * (x - 10) as f64;
            let v = (250.0 * 10f64.powf(db / 10.0)).round() as u8;
            Rgb([v, v, v])
        } else {
            Rgb([0, 0, 0])
        }
    });
    img.save(dir.join(name)).unwrap();
}

fn cli_config(output_path: &str, roi: RoiRequest, formats: Vec<OutputFormat>) -> CliConfig {
    CliConfig {
        image: "fiber.png".to_string(),
        roi: Some(roi),
        length: 59.0,
        canvas_zoom: None,
        smoothing_window: 5,
        output_path: output_path.to_string(),
        formats,
        plot_filename: "analysis_plot.png".to_string(),
        r_squared_threshold: 0.5,
        slope_threshold: 0.01,
        verbose: false,
        json_logs: false,
        monitor: false,
    }
}

#[tokio::test]
async fn test_end_to_end_analysis_writes_artifacts() {
    let temp_dir = TempDir::new().unwrap();
    write_decay_image(temp_dir.path(), "fiber.png");

    let config = cli_config(
        "results",
        RoiRequest::new(10.0, 4.0, 70.0, 16.0),
        vec![OutputFormat::Png, OutputFormat::Csv, OutputFormat::Json],
    );
    let storage = LocalStorage::new(temp_dir.path());
    let engine = AnalysisEngine::new(LightLossPipeline::new(storage, config));

    let outcome = engine.run().await.unwrap();

    // 每像素 -0.2 dB，長度 59 對應 59 個間隔
    assert!((outcome.report.slope_db + 0.2).abs() < 0.01);
    assert!(outcome.report.r_squared.unwrap() > 0.99);
    assert_eq!(outcome.report.points_total, 60);
    assert_eq!(outcome.report.points_fitted, 60);
    assert!(outcome
        .report
        .findings
        .iter()
        .any(|f| f.kind == FindingKind::Loss));
    assert!(outcome.summary.contains("--- Feedback & Suggestions ---"));

    assert_eq!(outcome.artifacts.len(), 3);
    let results = temp_dir.path().join("results");
    assert!(results.join("analysis_plot.png").exists());
    assert!(results.join("analysis_profile.csv").exists());

    let json = std::fs::read_to_string(results.join("analysis_report.json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(report["source"], "fiber.png");
    assert_eq!(report["roi"]["x1"], 10);
    assert_eq!(report["roi"]["y2"], 16);
}

#[tokio::test]
async fn test_roi_is_clamped_to_image_bounds() {
    let temp_dir = TempDir::new().unwrap();
    write_decay_image(temp_dir.path(), "fiber.png");

    let config = cli_config(
        "out",
        RoiRequest::new(70.0, 16.0, -20.0, 4.0),
        vec![OutputFormat::Json],
    );
    let storage = LocalStorage::new(temp_dir.path());
    let engine = AnalysisEngine::new(LightLossPipeline::new(storage, config));

    let outcome = engine.run().await.unwrap();

    // 左側黑色欄位無法轉為 dB，不參與擬合
    assert_eq!(outcome.report.roi.x1, 0);
    assert_eq!(outcome.report.points_total, 70);
    assert_eq!(outcome.report.points_fitted, 60);
}

#[tokio::test]
async fn test_black_region_fails_with_analysis_error() {
    let temp_dir = TempDir::new().unwrap();
    write_decay_image(temp_dir.path(), "fiber.png");

    let config = cli_config("out", RoiRequest::new(0.0, 0.0, 10.0, 4.0), vec![OutputFormat::Png]);
    let storage = LocalStorage::new(temp_dir.path());
    let engine = AnalysisEngine::new(LightLossPipeline::new(storage, config));

    let err = engine.run().await.unwrap_err();

    assert!(matches!(err, AnalyzerError::AnalysisError { .. }));
    assert_eq!(err.exit_code(), 2);
    assert!(!temp_dir.path().join("out").exists());
}

#[tokio::test]
async fn test_missing_image_is_reported() {
    let temp_dir = TempDir::new().unwrap();

    let config = cli_config("out", RoiRequest::new(0.0, 0.0, 10.0, 4.0), vec![OutputFormat::Png]);
    let engine = AnalysisEngine::new(LightLossPipeline::new(LocalStorage::new(temp_dir.path()), config));

    let err = engine.run().await.unwrap_err();
    assert!(matches!(err, AnalyzerError::IoError(_)));
}

#[tokio::test]
async fn test_noisy_profile_is_flagged() {
    let temp_dir = TempDir::new().unwrap();
    let img = GrayImage::from_fn(40, 8, |x, _| Luma([if x % 2 == 0 { 200 } else { 20 }]));
    img.save(temp_dir.path().join("fiber.png")).unwrap();

    let config = cli_config("out", RoiRequest::new(0.0, 0.0, 40.0, 8.0), vec![OutputFormat::Json]);
    let engine = AnalysisEngine::new(LightLossPipeline::new(LocalStorage::new(temp_dir.path()), config));

    let outcome = engine.run().await.unwrap();

    let kinds: Vec<FindingKind> = outcome.report.findings.iter().map(|f| f.kind).collect();
    assert!(kinds.contains(&FindingKind::PoorFit));
    assert!(kinds.contains(&FindingKind::HighNoise));
}
