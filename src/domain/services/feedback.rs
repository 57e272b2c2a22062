use crate::domain::model::{Finding, FindingKind, LinearFit};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedbackThresholds {
    /// R² below this is a poor fit.
    pub r_squared_min: f64,
    /// |slope| below this (dB/unit) is treated as flat.
    pub slope_near_zero: f64,
    /// Step noise relative to peak-to-peak range above this is flagged.
    pub noise_ratio: f64,
    /// Summed column intensity at or above this suggests saturation.
    pub saturation_sum: f64,
}

impl Default for FeedbackThresholds {
    fn default() -> Self {
        Self {
            r_squared_min: 0.5,
            slope_near_zero: 1e-2,
            noise_ratio: 0.5,
            saturation_sum: 60000.0,
        }
    }
}

pub fn generate_feedback(
    fit: &LinearFit,
    profile: &[f64],
    thresholds: &FeedbackThresholds,
) -> Vec<Finding> {
    let mut findings = vec![fit_quality(fit, thresholds), trend(fit, thresholds)];

    if let Some(noise) = high_noise(profile, thresholds) {
        findings.push(noise);
    }
    if let Some(saturation) = saturation(profile, thresholds) {
        findings.push(saturation);
    }

    findings
}

pub fn render_feedback(findings: &[Finding]) -> String {
    if findings.is_empty() {
        return "Analysis complete. Fit appears reasonable based on R² and slope.".to_string();
    }
    findings
        .iter()
        .map(|f| f.message.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn fit_quality(fit: &LinearFit, thresholds: &FeedbackThresholds) -> Finding {
    let r2 = fit.r_squared;
    // NaN 視為擬合不佳
    if !(r2 >= thresholds.r_squared_min) {
        Finding {
            kind: FindingKind::PoorFit,
            message: format!(
                "* Poor Linear Fit Quality (R² = {:.3} < {}):\n\
                 \x20 The linear model doesn't fit the dB-scaled data well.\n\
                 \x20 Suggestions:\n\
                 \x20 - Check ROI Selection: the region should decay exponentially (linear in dB). \
                 Avoid saturation, sharp peaks or dips, and reflections.\n\
                 \x20 - Noise: high noise can hide the linear trend in dB space.\n\
                 \x20 - Verify Length: the physical length must match the ROI width.",
                r2, thresholds.r_squared_min
            ),
        }
    } else {
        Finding {
            kind: FindingKind::GoodFit,
            message: format!("* Good Linear Fit Quality (R² = {:.3}).", r2),
        }
    }
}

fn trend(fit: &LinearFit, thresholds: &FeedbackThresholds) -> Finding {
    let slope = fit.slope_db;
    if slope.abs() < thresholds.slope_near_zero {
        Finding {
            kind: FindingKind::NearZeroSlope,
            message: format!(
                "* Near-Zero Slope (|m| ≈ {:.2e} dB/unit):\n\
                 \x20 The fitted change in dB is very small.\n\
                 \x20 Suggestions:\n\
                 \x20 - Check ROI: little actual gain or loss, or a region dominated by noise.\n\
                 \x20 - Increase Length/Signal Change: analyze a longer section or an image with clearer gain or loss.",
                slope.abs()
            ),
        }
    } else if slope > 0.0 {
        Finding {
            kind: FindingKind::Gain,
            message: format!(
                "* Increasing Trend / Gain Fitted (Slope = {:.4} dB/unit):\n\
                 \x20 The fit indicates an increasing signal strength.\n\
                 \x20 Suggestions:\n\
                 \x20 - Verify Physics: if loss is expected, check the ROI for reflections, \
                 scattering sources or detector non-linearity.",
                slope
            ),
        }
    } else {
        Finding {
            kind: FindingKind::Loss,
            message: format!(
                "* Decreasing Trend / Loss Fitted (Slope = {:.4} dB/unit):\n\
                 \x20 The fit indicates signal loss (α_dB = {:.4} dB/unit).\n\
                 \x20 Suggestions:\n\
                 \x20 - Consider Fit Quality (R²): if R² is low, the loss value might not be reliable.",
                slope,
                fit.loss_db()
            ),
        }
    }
}

fn high_noise(profile: &[f64], thresholds: &FeedbackThresholds) -> Option<Finding> {
    if profile.len() < 2 {
        return None;
    }

    let diffs: Vec<f64> = profile.windows(2).map(|w| w[1] - w[0]).collect();
    let mean = diffs.iter().sum::<f64>() / diffs.len() as f64;
    let noise = (diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / diffs.len() as f64).sqrt();

    let max = profile.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = profile.iter().copied().fold(f64::INFINITY, f64::min);
    let range = max - min;

    if range > 1e-9 && noise / range > thresholds.noise_ratio {
        Some(Finding {
            kind: FindingKind::HighNoise,
            message: format!(
                "* High Noise Detected (step noise / range = {:.2}):\n\
                 \x20 The intensity profile is noisy relative to the overall signal change.\n\
                 \x20 Suggestions:\n\
                 \x20 - Image Quality: use less camera noise and better contrast if possible.\n\
                 \x20 - ROI Averaging: include more rows so vertical summing averages out noise.\n\
                 \x20 - Smoothing: the plot shows a smoothed curve; stronger preprocessing may be needed.",
                noise / range
            ),
        })
    } else {
        None
    }
}

fn saturation(profile: &[f64], thresholds: &FeedbackThresholds) -> Option<Finding> {
    let max = profile.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max >= thresholds.saturation_sum {
        Some(Finding {
            kind: FindingKind::Saturation,
            message: format!(
                "* Potential Saturation (High Summed Value):\n\
                 \x20 Maximum summed intensity ({:.0}) is high. Saturation may affect results.\n\
                 \x20 Suggestions:\n\
                 \x20 - Adjust exposure or gain during image capture.\n\
                 \x20 - ROI Placement: avoid regions that appear fully saturated.\n\
                 \x20 - Check Bit Depth: the analysis assumes a linear detector response.",
                max
            ),
        })
    } else {
        None
    }
}
