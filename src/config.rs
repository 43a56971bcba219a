//! # Unified Application Configuration
//!
//! Consolidates segmentation, tagging, analysis and observability settings
//! into one structure that can be loaded from environment variables and
//! validated as a whole.

use crate::allergen_tagger::{MatchMode, TaggerConfig};
use crate::errors::{error_logging, AppError, AppResult};
use crate::menu_analysis::AnalysisConfig;
use crate::menu_segmenter::SegmenterConfig;
use crate::observability_config::ObservabilityConfig;
use std::env;
use std::str::FromStr;

/// Complete application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub segmenter: SegmenterConfig,
    pub tagger: TaggerConfig,
    pub analysis: AnalysisConfig,
    pub observability: ObservabilityConfig,
    /// Explicit taxonomy file; `None` uses the standard lookup
    pub taxonomy_path: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Unset variables keep their defaults; set but unparseable ones are errors.
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(value) = env_parse::<f64>("ALLERGEN_CONFIDENCE")? {
            config.tagger.confidence = value;
        }
        if let Ok(mode) = env::var("ALLERGEN_MATCH_MODE") {
            config.tagger.match_mode = MatchMode::from_str(&mode)?;
        }
        if let Some(value) = env_parse::<usize>("MAX_DESCRIPTION_LENGTH")? {
            config.segmenter.max_description_length = Some(value);
        }
        if let Some(value) = env_parse::<f64>("MIN_OCR_CONFIDENCE")? {
            config.analysis.min_ocr_confidence = value;
        }
        config.taxonomy_path = env::var("ALLERGEN_TAXONOMY_PATH").ok();
        config.observability = ObservabilityConfig::from_env();

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> AppResult<()> {
        self.segmenter
            .validate()
            .inspect_err(|e| error_logging::log_config_error(e, "segmenter", "validate"))?;
        self.tagger
            .validate()
            .inspect_err(|e| error_logging::log_config_error(e, "tagger", "validate"))?;
        self.analysis
            .validate()
            .inspect_err(|e| error_logging::log_config_error(e, "analysis", "validate"))?;
        self.observability
            .validate()
            .inspect_err(|e| error_logging::log_config_error(e, "observability", "validate"))?;
        Ok(())
    }

    /// One-line summary for startup logs
    pub fn summary(&self) -> String {
        format!(
            "match_mode={}, confidence={}, min_ocr_confidence={}, max_description_length={}, taxonomy={}",
            self.tagger.match_mode,
            self.tagger.confidence,
            self.analysis.min_ocr_confidence,
            self.segmenter
                .max_description_length
                .map_or_else(|| "unbounded".to_string(), |cap| cap.to_string()),
            self.taxonomy_path.as_deref().unwrap_or("<default lookup>")
        )
    }
}

fn env_parse<T: FromStr>(key: &str) -> AppResult<Option<T>> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::Config(format!("{} has an invalid value: '{}'", key, raw))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.summary().contains("match_mode=substring"));
        assert!(config.summary().contains("max_description_length=unbounded"));
    }

    #[test]
    fn test_invalid_sections_fail_validation() {
        let mut config = AppConfig::default();
        config.tagger.confidence = 2.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.segmenter.max_description_length = Some(0);
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.analysis.min_ocr_confidence = -0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_parse_missing_key() {
        let parsed: Option<u32> = env_parse("MENU_ALLERGENS_SURELY_UNSET_KEY").unwrap();
        assert!(parsed.is_none());
    }
}
