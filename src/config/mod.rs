pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::domain::model::{CoordinateSpace, OutputFormat, RoiRequest};
use crate::domain::services::feedback::FeedbackThresholds;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PLOT_FILENAME: &str = "analysis_plot.png";

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "light-analyzer")]
#[command(about = "Measure optical loss or gain along a region of an image")]
pub struct CliConfig {
    /// Image to analyze
    #[arg(long)]
    pub image: String,

    /// Region of interest as x1,y1,x2,y2 (corners in any order)
    #[arg(long, allow_hyphen_values = true)]
    pub roi: Option<RoiRequest>,

    /// Physical length spanned by the ROI width
    #[arg(long, default_value = "1.0")]
    pub length: f64,

    /// Interpret the ROI on the downscaled preview at this zoom level
    #[arg(long)]
    pub canvas_zoom: Option<f64>,

    /// Moving average window for the smoothed curve (odd, 1 disables)
    #[arg(long, default_value = "5")]
    pub smoothing_window: usize,

    #[arg(long, default_value = ".")]
    pub output_path: String,

    #[arg(long, value_enum, value_delimiter = ',', default_value = "png")]
    pub formats: Vec<OutputFormat>,

    #[arg(long, default_value = DEFAULT_PLOT_FILENAME)]
    pub plot_filename: String,

    #[arg(long, default_value = "0.5")]
    pub r_squared_threshold: f64,

    #[arg(long, default_value = "0.01")]
    pub slope_threshold: f64,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn image_path(&self) -> &str {
        &self.image
    }

    fn roi_request(&self) -> Option<RoiRequest> {
        self.roi
    }

    fn coordinate_space(&self) -> CoordinateSpace {
        match self.canvas_zoom {
            Some(zoom) => CoordinateSpace::Canvas { zoom },
            None => CoordinateSpace::Image,
        }
    }

    fn length(&self) -> f64 {
        self.length
    }

    fn smoothing_window(&self) -> usize {
        self.smoothing_window
    }

    fn thresholds(&self) -> FeedbackThresholds {
        FeedbackThresholds {
            r_squared_min: self.r_squared_threshold,
            slope_near_zero: self.slope_threshold,
            ..FeedbackThresholds::default()
        }
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[OutputFormat] {
        &self.formats
    }

    fn plot_filename(&self) -> &str {
        &self.plot_filename
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("--image", &self.image)?;
        validation::validate_required_field("--roi", &self.roi)?;
        validation::validate_positive_float("--length", self.length)?;
        if let Some(zoom) = self.canvas_zoom {
            validation::validate_positive_float("--canvas-zoom", zoom)?;
        }
        validation::validate_path("--output-path", &self.output_path)?;
        validation::validate_file_extension("--plot-filename", &self.plot_filename, &["png"])?;
        validation::validate_range("--r-squared-threshold", self.r_squared_threshold, 0.0, 1.0)?;
        validation::validate_range("--slope-threshold", self.slope_threshold, 0.0, f64::MAX)?;

        if self.smoothing_window != 1 && self.smoothing_window % 2 == 0 {
            tracing::warn!(
                "Smoothing window {} is not odd; smoothing will be disabled",
                self.smoothing_window
            );
        }
        Ok(())
    }
}
