use crate::utils::error::{AnalyzerError, Result};

/// Least-squares line `y = slope * x + intercept`.
pub fn fit_linear_db(x: &[f64], y: &[f64]) -> Result<(f64, f64)> {
    if x.len() != y.len() || x.len() < 2 {
        return Err(AnalyzerError::analysis(format!(
            "Insufficient or mismatched data for linear dB fitting ({} x values, {} y values)",
            x.len(),
            y.len()
        )));
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (sxy, sxx, sum_x2) = x
        .iter()
        .zip(y)
        .fold((0.0, 0.0, 0.0), |(sxy, sxx, sum_x2), (&xi, &yi)| {
            let dx = xi - mean_x;
            (sxy + dx * (yi - mean_y), sxx + dx * dx, sum_x2 + xi * xi)
        });

    // 相對於 x 的量級判斷，極短的長度仍可擬合
    if sxx <= f64::EPSILON * sum_x2 {
        return Err(AnalyzerError::analysis(
            "Distance values have no spread; cannot fit a slope",
        ));
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    tracing::debug!(
        "Linear dB fit: slope={:.4} dB/unit, intercept={:.2} dB",
        slope,
        intercept
    );
    Ok((slope, intercept))
}

pub fn r_squared(x: &[f64], y: &[f64], slope: f64, intercept: f64) -> Option<f64> {
    if x.is_empty() || x.len() != y.len() {
        return None;
    }

    let mean_y = y.iter().sum::<f64>() / y.len() as f64;
    let ss_res: f64 = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| (yi - (slope * xi + intercept)).powi(2))
        .sum();
    let ss_tot: f64 = y.iter().map(|&yi| (yi - mean_y).powi(2)).sum();

    if ss_tot <= 1e-15 {
        return Some(if ss_res < 1e-15 { 1.0 } else { 0.0 });
    }
    Some(1.0 - ss_res / ss_tot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_recovers_exact_line() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y: Vec<f64> = x.iter().map(|v| -2.5 * v + 1.0).collect();
        let (m, b) = fit_linear_db(&x, &y).unwrap();
        assert!((m + 2.5).abs() < 1e-12);
        assert!((b - 1.0).abs() < 1e-12);
        assert_eq!(r_squared(&x, &y, m, b), Some(1.0));
    }

    #[test]
    fn test_fit_requires_two_matching_points() {
        assert!(fit_linear_db(&[1.0], &[2.0]).is_err());
        assert!(fit_linear_db(&[1.0, 2.0], &[2.0]).is_err());
        assert!(fit_linear_db(&[1.0, 1.0], &[2.0, 3.0]).is_err());
        assert!(fit_linear_db(&[0.0, 0.0, 0.0], &[2.0, 3.0, 4.0]).is_err());
        assert!(fit_linear_db(&[1e6, 1e6], &[2.0, 3.0]).is_err());
    }

    #[test]
    fn test_fit_handles_tiny_distances() {
        let x: Vec<f64> = (0..200).map(|i| i as f64 * 1e-10).collect();
        let y: Vec<f64> = x.iter().map(|v| -4.0e9 * v - 1.5).collect();
        let (m, b) = fit_linear_db(&x, &y).unwrap();
        assert!((m / -4.0e9 - 1.0).abs() < 1e-9);
        assert!((b + 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_r_squared_flat_data() {
        let x = [0.0, 1.0, 2.0];
        let y = [-3.0, -3.0, -3.0];
        assert_eq!(r_squared(&x, &y, 0.0, -3.0), Some(1.0));
        assert_eq!(r_squared(&x, &y, 1.0, -3.0), Some(0.0));
        assert_eq!(r_squared(&[], &[], 1.0, 0.0), None);
    }

    #[test]
    fn test_r_squared_partial_fit() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.0, -1.0, -1.0, -3.0];
        let (m, b) = fit_linear_db(&x, &y).unwrap();
        let r2 = r_squared(&x, &y, m, b).unwrap();
        assert!(r2 > 0.8 && r2 < 1.0);
    }
}
