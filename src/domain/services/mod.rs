pub mod feedback;
pub mod fit;
pub mod profile;
pub mod roi;

use crate::domain::model::{AnalysisResult, LinearFit, RoiSample};
use crate::utils::error::{AnalyzerError, Result};
use feedback::{generate_feedback, render_feedback, FeedbackThresholds};

/// Runs the full loss measurement on a cropped ROI.
pub fn analyze(
    sample: &RoiSample,
    length: f64,
    smoothing_window: usize,
    thresholds: &FeedbackThresholds,
) -> Result<AnalysisResult> {
    if !length.is_finite() || length <= 0.0 {
        return Err(AnalyzerError::analysis("Length must be positive."));
    }

    let intensity = profile::intensity_profile(&sample.pixels)
        .filter(|p| p.len() >= 2)
        .ok_or_else(|| {
            AnalyzerError::analysis("Intensity profile is empty or too short after processing.")
        })?;

    let x_data = profile::linspace(0.0, length, intensity.len());
    let db = profile::db_profile(&intensity)?;
    let x_fit: Vec<f64> = db.valid_indices.iter().map(|&i| x_data[i]).collect();

    // 平滑只用於視覺化，不參與擬合
    let (smoothed, smoothed_db) = if smoothing_window > 1 {
        let smoothed = profile::moving_average(&intensity, smoothing_window);
        let smoothed_db = match profile::db_profile(&smoothed) {
            Ok(db) => Some(db),
            Err(e) => {
                tracing::warn!("Smoothed profile dropped: {}", e);
                None
            }
        };
        (Some(smoothed), smoothed_db)
    } else {
        (None, None)
    };

    let (slope_db, intercept_db) = fit::fit_linear_db(&x_fit, &db.values)?;
    let r_squared =
        fit::r_squared(&x_fit, &db.values, slope_db, intercept_db).unwrap_or(f64::NAN);
    let fit = LinearFit {
        slope_db,
        intercept_db,
        r_squared,
    };

    let findings = generate_feedback(&fit, &intensity, thresholds);
    let summary = format!(
        "Loss/Gain (α_dB): {:.4} dB/unit\n\
         Intercept (dB): {:.2} dB\n\
         R² (linear fit): {:.3}\n\n\
         --- Feedback & Suggestions ---\n{}",
        fit.slope_db,
        fit.intercept_db,
        fit.r_squared,
        render_feedback(&findings)
    );

    tracing::info!(
        "Fitted {} of {} points: α_dB={:.4} dB/unit, R²={:.3}",
        db.len(),
        intensity.len(),
        fit.slope_db,
        fit.r_squared
    );

    Ok(AnalysisResult {
        source: sample.source.clone(),
        roi: sample.roi,
        length,
        smoothing_window,
        x_data,
        intensity,
        db,
        smoothed,
        smoothed_db,
        fit,
        findings,
        summary,
    })
}
