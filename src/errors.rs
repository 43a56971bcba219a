//! # Application Error Types
//!
//! This module defines the error types used throughout menu-allergens.
//! Segmentation and tagging never fail; errors only surface while loading
//! and validating configuration such as custom allergen taxonomies.

use thiserror::Error;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AppError {
    /// Configuration validation errors (taxonomy tables, tuning values)
    #[error("[CONFIG] {0}")]
    Config(String),
    /// Validation errors for caller supplied values (OCR confidence, etc.)
    #[error("[VALIDATION] {0}")]
    Validation(String),
    /// File system errors
    #[error("[IO] {0}")]
    Io(String),
    /// Malformed serialized documents
    #[error("[PARSE] {0}")]
    Parse(String),
    /// Internal application errors
    #[error("[INTERNAL] {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities
pub mod error_logging {
    use tracing::error;

    /// Log configuration errors during startup/initialization
    pub fn log_config_error(error: &impl std::fmt::Display, config_key: &str, operation: &str) {
        error!(
            error = %error,
            config_key = %config_key,
            operation = %operation,
            "Configuration error"
        );
    }

    /// Log taxonomy file errors with path context
    pub fn log_taxonomy_error(error: &impl std::fmt::Display, path: &str, operation: &str) {
        error!(
            error = %error,
            path = %path,
            operation = %operation,
            "Allergen taxonomy could not be loaded"
        );
    }

    /// Log validation errors with input context
    pub fn log_validation_error(
        error: &impl std::fmt::Display,
        operation: &str,
        input_type: &str,
        input_value: Option<&str>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            input_type = %input_type,
            input_value = ?input_value.map(|v| {
                if v.chars().count() > 100 {
                    format!("{}...", v.chars().take(100).collect::<String>())
                } else {
                    v.to_string()
                }
            }),
            "Validation failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_prefixes() {
        assert_eq!(
            AppError::Config("empty keyword".to_string()).to_string(),
            "[CONFIG] empty keyword"
        );
        assert_eq!(
            AppError::Validation("bad confidence".to_string()).to_string(),
            "[VALIDATION] bad confidence"
        );
    }

    #[test]
    fn test_error_conversions() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert!(matches!(AppError::from(io), AppError::Io(_)));

        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(AppError::from(parse), AppError::Parse(_)));

        let internal = AppError::from(anyhow::anyhow!("boom"));
        assert_eq!(internal, AppError::Internal("boom".to_string()));
    }
}
