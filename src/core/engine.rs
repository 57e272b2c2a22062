use crate::core::{AnalysisReport, Pipeline};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub summary: String,
    pub report: AnalysisReport,
    pub artifacts: Vec<String>,
}

pub struct AnalysisEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> AnalysisEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<AnalysisOutcome> {
        tracing::info!("🚀 Starting light loss analysis");
        self.monitor.log_stats("Start");

        // Extract
        let sample = self.pipeline.extract().await?;
        tracing::info!(
            "Extracted ROI {} ({}x{} px)",
            sample.roi,
            sample.roi.width(),
            sample.roi.height()
        );
        self.monitor.log_stats("Extract");

        // Transform
        let result = self.pipeline.transform(sample).await?;
        let summary = result.summary.clone();
        let report = result.report();
        tracing::info!(
            "Analyzed {} columns, {} used in fit",
            report.points_total,
            report.points_fitted
        );
        self.monitor.log_stats("Transform");

        // Load
        let artifacts = self.pipeline.load(result).await?;
        tracing::info!("Wrote {} artifact(s)", artifacts.len());
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(AnalysisOutcome {
            summary,
            report,
            artifacts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AnalysisResult, RoiSample};
    use crate::domain::model::{DbProfile, LinearFit, Roi};
    use crate::utils::error::AnalyzerError;
    use image::GrayImage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct MockPipeline {
        fail_transform: bool,
        load_calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl Pipeline for MockPipeline {
        async fn extract(&self) -> Result<RoiSample> {
            Ok(RoiSample {
                source: "mock.png".to_string(),
                roi: Roi { x1: 0, y1: 0, x2: 2, y2: 1 },
                image_width: 2,
                image_height: 1,
                pixels: GrayImage::new(2, 1),
            })
        }

        async fn transform(&self, sample: RoiSample) -> Result<AnalysisResult> {
            if self.fail_transform {
                return Err(AnalyzerError::analysis("Peak intensity is near zero."));
            }
            Ok(AnalysisResult {
                source: sample.source,
                roi: sample.roi,
                length: 1.0,
                smoothing_window: 1,
                x_data: vec![0.0, 1.0],
                intensity: vec![4.0, 2.0],
                db: DbProfile {
                    values: vec![0.0, -3.0103],
                    valid_indices: vec![0, 1],
                },
                smoothed: None,
                smoothed_db: None,
                fit: LinearFit {
                    slope_db: -3.0103,
                    intercept_db: 0.0,
                    r_squared: 1.0,
                },
                findings: vec![],
                summary: "Loss/Gain (α_dB): -3.0103 dB/unit".to_string(),
            })
        }

        async fn load(&self, _result: AnalysisResult) -> Result<Vec<String>> {
            self.load_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["out/analysis_plot.png".to_string()])
        }
    }

    #[tokio::test]
    async fn test_run_chains_phases() {
        let load_calls = Arc::new(AtomicUsize::new(0));
        let engine = AnalysisEngine::new(MockPipeline {
            fail_transform: false,
            load_calls: load_calls.clone(),
        });

        let outcome = engine.run().await.unwrap();

        assert_eq!(load_calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.artifacts, vec!["out/analysis_plot.png".to_string()]);
        assert_eq!(outcome.report.source, "mock.png");
        assert_eq!(outcome.report.points_total, 2);
        assert!(outcome.summary.starts_with("Loss/Gain"));
    }

    #[tokio::test]
    async fn test_run_stops_on_transform_error() {
        let load_calls = Arc::new(AtomicUsize::new(0));
        let engine = AnalysisEngine::new_with_monitoring(
            MockPipeline {
                fail_transform: true,
                load_calls: load_calls.clone(),
            },
            true,
        );

        let err = engine.run().await.unwrap_err();

        assert!(matches!(err, AnalyzerError::AnalysisError { .. }));
        assert_eq!(load_calls.load(Ordering::SeqCst), 0);
    }
}
