use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Image decoding failed: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid region of interest: {message}")]
    RoiError { message: String },

    #[error("Analysis input error: {message}")]
    AnalysisError { message: String },

    #[error("Plot rendering failed: {message}")]
    PlotError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Analysis,
    Output,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AnalyzerError {
    pub fn analysis(message: impl Into<String>) -> Self {
        Self::AnalysisError {
            message: message.into(),
        }
    }

    pub fn roi(message: impl Into<String>) -> Self {
        Self::RoiError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ImageError(_) | Self::RoiError { .. } => ErrorCategory::Input,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorCategory::Configuration,
            Self::AnalysisError { .. } => ErrorCategory::Analysis,
            Self::CsvError(_) | Self::SerializationError(_) | Self::PlotError { .. } => {
                ErrorCategory::Output
            }
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 圖表失敗不影響分析結果
            Self::PlotError { .. } => ErrorSeverity::Low,
            Self::RoiError { .. } | Self::AnalysisError { .. } => ErrorSeverity::Medium,
            Self::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::ImageError(_) => {
                "Check that the file is a readable PNG, JPEG, BMP, GIF or TIFF image".to_string()
            }
            Self::IoError(e) if e.kind() == std::io::ErrorKind::NotFound => {
                "Check that the image path exists and is spelled correctly".to_string()
            }
            Self::IoError(_) => {
                "Check file permissions and that the output directory is writable".to_string()
            }
            Self::CsvError(_) | Self::SerializationError(_) => {
                "Retry with a different output format or output directory".to_string()
            }
            Self::ConfigError { .. } | Self::ConfigValidationError { .. } => {
                "Review the configuration file syntax and values".to_string()
            }
            Self::MissingConfigError { field } => {
                format!("Provide a value for '{}'", field)
            }
            Self::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of '{}'", field)
            }
            Self::RoiError { .. } => {
                "Select a region with non-zero width and height inside the image bounds"
                    .to_string()
            }
            Self::AnalysisError { .. } => {
                "Select a wider ROI over a region with visible, non-saturated signal".to_string()
            }
            Self::PlotError { .. } => {
                "Analysis results are still valid; check the plot output directory".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("Could not use the input image: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Analysis => format!("Analysis failed: {}", self),
            ErrorCategory::Output => format!("Could not write results: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }

    /// Process exit code for a failed run.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plot_errors_are_low_severity() {
        let err = AnalyzerError::PlotError {
            message: "encoder closed".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.category(), ErrorCategory::Output);
        assert_eq!(err.exit_code(), 0);
    }

    #[test]
    fn test_exit_codes_follow_severity() {
        assert_eq!(AnalyzerError::analysis("too short").exit_code(), 2);
        assert_eq!(
            AnalyzerError::MissingConfigError {
                field: "analysis.roi".to_string()
            }
            .exit_code(),
            1
        );
        let io = AnalyzerError::IoError(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(io.exit_code(), 3);
    }

    #[test]
    fn test_not_found_suggestion_mentions_path() {
        let err = AnalyzerError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing.png",
        ));
        assert!(err.recovery_suggestion().contains("image path"));
        assert!(err.user_friendly_message().starts_with("System error"));
    }
}
