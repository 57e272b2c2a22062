use crate::config::DEFAULT_PLOT_FILENAME;
use crate::core::ConfigProvider;
use crate::domain::model::{CoordinateSpace, OutputFormat, RoiRequest};
use crate::domain::services::feedback::FeedbackThresholds;
use crate::utils::error::{AnalyzerError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub image_path: String,
    pub roi: Option<RoiRequest>,
    #[serde(default = "default_length")]
    pub length: f64,
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,
    pub canvas_zoom: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackConfig {
    pub r_squared_min: Option<f64>,
    pub slope_near_zero: Option<f64>,
    pub noise_ratio: Option<f64>,
    pub saturation_sum: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub output_path: String,
    #[serde(default = "default_formats")]
    pub formats: Vec<OutputFormat>,
    #[serde(default = "default_plot_filename")]
    pub plot_filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            formats: default_formats(),
            plot_filename: default_plot_filename(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default)]
    pub enabled: bool,
    pub json_logs: Option<bool>,
}

fn default_length() -> f64 {
    1.0
}

fn default_smoothing_window() -> usize {
    5
}

fn default_output_path() -> String {
    ".".to_string()
}

fn default_formats() -> Vec<OutputFormat> {
    vec![OutputFormat::Png]
}

fn default_plot_filename() -> String {
    DEFAULT_PLOT_FILENAME.to_string()
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AnalyzerError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${IMAGE_DIR})，未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| AnalyzerError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("analysis.image_path", &self.analysis.image_path)?;
        validation::validate_required_field("analysis.roi", &self.analysis.roi)?;
        validation::validate_positive_float("analysis.length", self.analysis.length)?;
        if let Some(zoom) = self.analysis.canvas_zoom {
            validation::validate_positive_float("analysis.canvas_zoom", zoom)?;
        }

        let t = self.thresholds();
        validation::validate_range("feedback.r_squared_min", t.r_squared_min, 0.0, 1.0)?;
        validation::validate_range("feedback.slope_near_zero", t.slope_near_zero, 0.0, f64::MAX)?;
        validation::validate_range("feedback.noise_ratio", t.noise_ratio, 0.0, f64::MAX)?;
        validation::validate_positive_float("feedback.saturation_sum", t.saturation_sum)?;

        validation::validate_path("output.output_path", &self.output.output_path)?;
        validation::validate_file_extension("output.plot_filename", &self.output.plot_filename, &["png"])?;
        if self.output.formats.is_empty() {
            return Err(AnalyzerError::InvalidConfigValueError {
                field: "output.formats".to_string(),
                value: "[]".to_string(),
                reason: "At least one output format is required (png, csv, json)".to_string(),
            });
        }

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn image_path(&self) -> &str {
        &self.analysis.image_path
    }

    fn roi_request(&self) -> Option<RoiRequest> {
        self.analysis.roi
    }

    fn coordinate_space(&self) -> CoordinateSpace {
        match self.analysis.canvas_zoom {
            Some(zoom) => CoordinateSpace::Canvas { zoom },
            None => CoordinateSpace::Image,
        }
    }

    fn length(&self) -> f64 {
        self.analysis.length
    }

    fn smoothing_window(&self) -> usize {
        self.analysis.smoothing_window
    }

    fn thresholds(&self) -> FeedbackThresholds {
        let defaults = FeedbackThresholds::default();
        let f = &self.feedback;
        FeedbackThresholds {
            r_squared_min: f.r_squared_min.unwrap_or(defaults.r_squared_min),
            slope_near_zero: f.slope_near_zero.unwrap_or(defaults.slope_near_zero),
            noise_ratio: f.noise_ratio.unwrap_or(defaults.noise_ratio),
            saturation_sum: f.saturation_sum.unwrap_or(defaults.saturation_sum),
        }
    }

    fn output_path(&self) -> &str {
        &self.output.output_path
    }

    fn output_formats(&self) -> &[OutputFormat] {
        &self.output.formats
    }

    fn plot_filename(&self) -> &str {
        &self.output.plot_filename
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
