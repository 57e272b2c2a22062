use crate::adapters::{export, plot};
use crate::core::{AnalysisResult, ConfigProvider, Pipeline, RoiSample, Storage};
use crate::domain::model::OutputFormat;
use crate::domain::services::{analyze, profile::to_grayscale, roi::resolve_roi};
use crate::utils::error::{AnalyzerError, ErrorSeverity, Result};
use std::path::Path;

pub const PROFILE_CSV_FILENAME: &str = "analysis_profile.csv";
pub const REPORT_JSON_FILENAME: &str = "analysis_report.json";

pub struct LightLossPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
    pub(crate) plot_options: plot::PlotOptions,
}

impl<S: Storage, C: ConfigProvider> LightLossPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            plot_options: plot::PlotOptions::default(),
        }
    }

    pub fn with_plot_options(mut self, plot_options: plot::PlotOptions) -> Self {
        self.plot_options = plot_options;
        self
    }

    fn output_file(&self, filename: &str) -> String {
        Path::new(self.config.output_path())
            .join(filename)
            .to_string_lossy()
            .into_owned()
    }

    async fn write_plot(&self, result: &AnalysisResult) -> Result<String> {
        let img = plot::render_plot(result, &self.plot_options)?;
        let bytes = plot::encode_png(&img).map_err(|e| AnalyzerError::PlotError {
            message: e.to_string(),
        })?;
        let path = self.output_file(self.config.plot_filename());
        self.storage.write_file(&path, &bytes).await?;
        Ok(path)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for LightLossPipeline<S, C> {
    async fn extract(&self) -> Result<RoiSample> {
        let image_path = self.config.image_path();
        tracing::debug!("Reading image: {}", image_path);
        let bytes = self.storage.read_file(image_path).await?;

        let gray = to_grayscale(image::load_from_memory(&bytes)?);
        let (width, height) = gray.dimensions();
        tracing::info!("🖼️ Loaded {} ({}x{})", image_path, width, height);

        let request = self
            .config
            .roi_request()
            .ok_or_else(|| AnalyzerError::MissingConfigError {
                field: "roi".to_string(),
            })?;
        let roi = resolve_roi(&request, self.config.coordinate_space(), width, height)?;
        let pixels = image::imageops::crop_imm(&gray, roi.x1, roi.y1, roi.width(), roi.height())
            .to_image();

        Ok(RoiSample {
            source: image_path.to_string(),
            roi,
            image_width: width,
            image_height: height,
            pixels,
        })
    }

    async fn transform(&self, sample: RoiSample) -> Result<AnalysisResult> {
        tracing::debug!(
            "Analyzing ROI {} ({}x{} px) over length {}",
            sample.roi,
            sample.roi.width(),
            sample.roi.height(),
            self.config.length()
        );
        analyze(
            &sample,
            self.config.length(),
            self.config.smoothing_window(),
            &self.config.thresholds(),
        )
    }

    async fn load(&self, result: AnalysisResult) -> Result<Vec<String>> {
        let mut written = Vec::new();

        for format in self.config.output_formats() {
            match format {
                OutputFormat::Png => match self.write_plot(&result).await {
                    Ok(path) => {
                        tracing::info!("📈 Plot saved to: {}", path);
                        written.push(path);
                    }
                    // 圖表失敗時保留分析結果
                    Err(e) if e.severity() == ErrorSeverity::Low => {
                        tracing::warn!("Failed to save plot: {}", e);
                    }
                    Err(e) => return Err(e),
                },
                OutputFormat::Csv => {
                    let path = self.output_file(PROFILE_CSV_FILENAME);
                    let csv = export::profile_csv(&result)?;
                    self.storage.write_file(&path, csv.as_bytes()).await?;
                    written.push(path);
                }
                OutputFormat::Json => {
                    let path = self.output_file(REPORT_JSON_FILENAME);
                    let json = export::report_json(&result.report())?;
                    self.storage.write_file(&path, json.as_bytes()).await?;
                    written.push(path);
                }
            }
        }

        tracing::debug!("Wrote {} artifact(s)", written.len());
        Ok(written)
    }
}
