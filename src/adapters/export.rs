use crate::domain::model::{AnalysisReport, AnalysisResult, DbProfile};
use crate::utils::error::{AnalyzerError, Result};

fn spread(db: &DbProfile, len: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; len];
    for (&i, &v) in db.valid_indices.iter().zip(&db.values) {
        if let Some(slot) = out.get_mut(i) {
            *slot = Some(v);
        }
    }
    out
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// One row per ROI column: `x,intensity,intensity_db,smoothed,smoothed_db`.
pub fn profile_csv(result: &AnalysisResult) -> Result<String> {
    let n = result.x_data.len();
    let db = spread(&result.db, n);
    let smoothed_db = result
        .smoothed_db
        .as_ref()
        .map(|s| spread(s, n))
        .unwrap_or_else(|| vec![None; n]);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["x", "intensity", "intensity_db", "smoothed", "smoothed_db"])?;

    for i in 0..n {
        let smoothed = result.smoothed.as_ref().and_then(|s| s.get(i).copied());
        writer.write_record([
            result.x_data[i].to_string(),
            result.intensity[i].to_string(),
            cell(db[i]),
            cell(smoothed),
            cell(smoothed_db[i]),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AnalyzerError::IoError(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| AnalyzerError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

pub fn report_json(report: &AnalysisReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{LinearFit, Roi};

    fn result() -> AnalysisResult {
        AnalysisResult {
            source: "strip.png".to_string(),
            roi: Roi { x1: 2, y1: 0, x2: 5, y2: 2 },
            length: 2.0,
            smoothing_window: 3,
            x_data: vec![0.0, 1.0, 2.0],
            intensity: vec![10.0, 0.0, 1.0],
            db: DbProfile {
                values: vec![0.0, -10.0],
                valid_indices: vec![0, 2],
            },
            smoothed: Some(vec![10.0, 5.5, 1.0]),
            smoothed_db: Some(DbProfile {
                values: vec![0.0, -2.5, -10.0],
                valid_indices: vec![0, 1, 2],
            }),
            fit: LinearFit {
                slope_db: -5.0,
                intercept_db: 0.0,
                r_squared: 1.0,
            },
            findings: vec![],
            summary: String::new(),
        }
    }

    #[test]
    fn test_profile_csv_leaves_invalid_db_empty() {
        let csv = profile_csv(&result()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "x,intensity,intensity_db,smoothed,smoothed_db");
        assert_eq!(lines[1], "0,10,0,10,0");
        assert_eq!(lines[2], "1,0,,5.5,-2.5");
        assert_eq!(lines[3], "2,1,-10,1,-10");
    }

    #[test]
    fn test_profile_csv_without_smoothing() {
        let mut unsmoothed = result();
        unsmoothed.smoothed = None;
        unsmoothed.smoothed_db = None;

        let csv: String = profile_csv(&unsmoothed).unwrap();
        assert_eq!(csv.lines().last(), Some("2,1,-10,,"));
        assert_eq!(csv.lines().count(), 4);
    }

    #[test]
    fn test_report_json_fields() {
        let json = report_json(&result().report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["slope_db"], -5.0);
        assert_eq!(value["loss_db_per_unit"], 5.0);
        assert_eq!(value["roi"]["x1"], 2);
        assert_eq!(value["points_fitted"], 2);
        assert!(value["generated_at"].is_string());
    }
}
