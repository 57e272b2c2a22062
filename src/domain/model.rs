use chrono::{DateTime, Utc};
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rectangle in original-image pixels. `x2`/`y2` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roi {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Roi {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x1, self.y1, self.x2, self.y2)
    }
}

/// Two ROI corners as entered by the user, in either order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct RoiRequest {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl RoiRequest {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Same rectangle with `x1 <= x2` and `y1 <= y2`.
    pub fn ordered(&self) -> Self {
        Self {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }
}

impl From<[f64; 4]> for RoiRequest {
    fn from(c: [f64; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

impl From<RoiRequest> for [f64; 4] {
    fn from(r: RoiRequest) -> Self {
        [r.x1, r.y1, r.x2, r.y2]
    }
}

impl FromStr for RoiRequest {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid ROI coordinate in '{}': {}", s, e))?;

        match parts.as_slice() {
            [x1, y1, x2, y2] if parts.iter().all(|v| v.is_finite()) => {
                Ok(Self::new(*x1, *y1, *x2, *y2))
            }
            [_, _, _, _] => Err(format!("ROI coordinates must be finite: '{}'", s)),
            _ => Err(format!(
                "ROI must have exactly 4 values x1,y1,x2,y2 (got {})",
                parts.len()
            )),
        }
    }
}

impl fmt::Display for RoiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x1, self.y1, self.x2, self.y2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "space", rename_all = "snake_case")]
pub enum CoordinateSpace {
    #[default]
    Image,
    /// ROI measured on the downscaled preview at the given zoom level.
    Canvas { zoom: f64 },
}

/// Cropped grayscale pixels of the resolved ROI.
#[derive(Debug, Clone)]
pub struct RoiSample {
    pub source: String,
    pub roi: Roi,
    pub image_width: u32,
    pub image_height: u32,
    pub pixels: GrayImage,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbProfile {
    pub values: Vec<f64>,
    /// Index into the raw profile for each entry of `values`.
    pub valid_indices: Vec<usize>,
}

impl DbProfile {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when every raw point produced a dB value.
    pub fn is_complete(&self, raw_len: usize) -> bool {
        self.values.len() == raw_len
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope_db: f64,
    pub intercept_db: f64,
    pub r_squared: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope_db * x + self.intercept_db
    }

    /// Loss as a positive number of dB per unit length.
    pub fn loss_db(&self) -> f64 {
        -self.slope_db
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    GoodFit,
    PoorFit,
    NearZeroSlope,
    Gain,
    Loss,
    HighNoise,
    Saturation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub source: String,
    pub roi: Roi,
    pub length: f64,
    pub smoothing_window: usize,
    pub x_data: Vec<f64>,
    pub intensity: Vec<f64>,
    pub db: DbProfile,
    pub smoothed: Option<Vec<f64>>,
    pub smoothed_db: Option<DbProfile>,
    pub fit: LinearFit,
    pub findings: Vec<Finding>,
    pub summary: String,
}

impl AnalysisResult {
    /// x values paired with the dB points used by the fit.
    pub fn fitted_x(&self) -> Vec<f64> {
        self.db.valid_indices.iter().map(|&i| self.x_data[i]).collect()
    }

    pub fn report(&self) -> AnalysisReport {
        AnalysisReport {
            source: self.source.clone(),
            roi: self.roi,
            length: self.length,
            smoothing_window: self.smoothing_window,
            slope_db: self.fit.slope_db,
            intercept_db: self.fit.intercept_db,
            r_squared: self.fit.r_squared.is_finite().then_some(self.fit.r_squared),
            loss_db_per_unit: self.fit.loss_db(),
            points_total: self.intensity.len(),
            points_fitted: self.db.len(),
            peak_intensity: self.intensity.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            findings: self.findings.clone(),
            generated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub source: String,
    pub roi: Roi,
    pub length: f64,
    pub smoothing_window: usize,
    pub slope_db: f64,
    pub intercept_db: f64,
    pub r_squared: Option<f64>,
    pub loss_db_per_unit: f64,
    pub points_total: usize,
    pub points_fitted: usize,
    pub peak_intensity: f64,
    pub findings: Vec<Finding>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Csv,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Png => "png",
            Self::Csv => "csv",
            Self::Json => "json",
        };
        f.write_str(name)
    }
}
