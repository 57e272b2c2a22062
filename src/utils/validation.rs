use crate::utils::error::{AnalyzerError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(AnalyzerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(AnalyzerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_float(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AnalyzerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value must be positive".to_string(),
        });
    }
    Ok(())
}

pub fn validate_file_extension(field_name: &str, file: &str, allowed_extensions: &[&str]) -> Result<()> {
    let extension = std::path::Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension {
        Some(ext) if allowed_extensions.contains(&ext.as_str()) => Ok(()),
        Some(ext) => Err(AnalyzerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                ext,
                allowed_extensions.join(", ")
            ),
        }),
        None => Err(AnalyzerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        }),
    }
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| AnalyzerError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    // NaN 不滿足任何比較，一併拒絕
    if !(value >= min && value <= max) {
        return Err(AnalyzerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("analysis.image_path", "sample.png").is_ok());
        assert!(validate_path("analysis.image_path", "").is_err());
        assert!(validate_path("analysis.image_path", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_positive_float() {
        assert!(validate_positive_float("analysis.length", 2.5).is_ok());
        assert!(validate_positive_float("analysis.length", 0.0).is_err());
        assert!(validate_positive_float("analysis.length", -1.0).is_err());
        assert!(validate_positive_float("analysis.length", f64::NAN).is_err());
        assert!(validate_positive_float("analysis.length", f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension("output.plot_filename", "plot.png", &["png"]).is_ok());
        assert!(validate_file_extension("output.plot_filename", "PLOT.PNG", &["png"]).is_ok());
        assert!(validate_file_extension("output.plot_filename", "plot.jpg", &["png"]).is_err());
        assert!(validate_file_extension("output.plot_filename", "plot", &["png"]).is_err());
    }

    #[test]
    fn test_validate_range_rejects_nan() {
        assert!(validate_range("feedback.r_squared_min", 0.5, 0.0, 1.0).is_ok());
        assert!(validate_range("feedback.r_squared_min", 1.5, 0.0, 1.0).is_err());
        assert!(validate_range("feedback.r_squared_min", f64::NAN, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some(3);
        let missing: Option<i32> = None;
        assert_eq!(*validate_required_field("analysis.roi", &present).unwrap(), 3);
        assert!(validate_required_field("analysis.roi", &missing).is_err());
    }
}
