//! # Menu Analysis Pipeline
//!
//! Runs segmentation and allergen tagging over one OCR result and shapes the
//! output into records the surrounding application can persist: menu-level
//! allergen flags and one [`MenuItemDraft`] per recovered item.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::allergen_tagger::{AllergenDetectionResult, AllergenTagger};
use crate::config::AppConfig;
use crate::errors::{error_logging, AppError, AppResult};
use crate::menu_segmenter::{MenuSegmenter, ParsedMenuItem};
use crate::ocr::OcrResult;
use crate::taxonomy::{AllergenTaxonomy, AllergenType};

/// Configuration options for menu analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// OCR results below this confidence are flagged for manual review
    pub min_ocr_confidence: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_ocr_confidence: 0.6,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> AppResult<()> {
        if !self.min_ocr_confidence.is_finite() || !(0.0..=1.0).contains(&self.min_ocr_confidence)
        {
            return Err(AppError::Config(format!(
                "min_ocr_confidence must be within [0, 1], got {}",
                self.min_ocr_confidence
            )));
        }
        Ok(())
    }
}

/// Persistence-ready menu item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemDraft {
    pub name: String,
    pub description: String,
    pub price: Option<f64>,
    pub category: String,
    pub detected_allergens: Vec<AllergenType>,
    pub tags: Vec<String>,
    pub is_available: bool,
}

/// Everything recovered from one menu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuAnalysis {
    pub items: Vec<ParsedMenuItem>,
    pub detection: AllergenDetectionResult,
    /// Aggregate allergen types, as stored on the menu document
    pub allergen_flags: Vec<String>,
    pub drafts: Vec<MenuItemDraft>,
    /// Version of the taxonomy the tags were produced with
    pub taxonomy_version: String,
    pub ocr_confidence: Option<f64>,
    pub low_confidence: bool,
}

/// Segment + tag pipeline
#[derive(Debug, Clone, Default)]
pub struct MenuAnalyzer {
    tagger: AllergenTagger,
    config: AnalysisConfig,
}

impl MenuAnalyzer {
    pub fn new(tagger: AllergenTagger) -> Self {
        Self {
            tagger,
            config: AnalysisConfig::default(),
        }
    }

    pub fn with_config(tagger: AllergenTagger, config: AnalysisConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self { tagger, config })
    }

    /// Build the full pipeline from application configuration
    pub fn from_app_config(config: &AppConfig, taxonomy: AllergenTaxonomy) -> AppResult<Self> {
        config.validate()?;
        let segmenter = MenuSegmenter::with_config(config.segmenter.clone())?;
        let tagger =
            AllergenTagger::with_config(taxonomy, config.tagger.clone())?.with_segmenter(segmenter);
        Self::with_config(tagger, config.analysis.clone())
    }

    pub fn tagger(&self) -> &AllergenTagger {
        &self.tagger
    }

    /// Analyze an OCR result, rejecting out-of-range confidence values
    pub fn analyze(&self, ocr: &OcrResult) -> AppResult<MenuAnalysis> {
        if let Err(e) = ocr.validate() {
            error_logging::log_validation_error(&e, "analyze", "ocr_result", Some(&ocr.text));
            return Err(e);
        }

        let low_confidence = ocr.confidence < self.config.min_ocr_confidence;
        if low_confidence {
            warn!(
                ocr_confidence = ocr.confidence,
                threshold = self.config.min_ocr_confidence,
                "OCR confidence below threshold, results need review"
            );
        }
        crate::observability::record_analysis_metrics(ocr.confidence, low_confidence);

        let mut analysis = self.analyze_text(&ocr.text);
        analysis.ocr_confidence = Some(ocr.confidence);
        analysis.low_confidence = low_confidence;
        Ok(analysis)
    }

    /// Analyze raw menu text with no OCR metadata
    pub fn analyze_text(&self, raw_text: &str) -> MenuAnalysis {
        let items = self.tagger.segmenter().segment(raw_text);
        let detection = self.tagger.detect_for_items(&items);
        let allergen_flags = detection
            .allergen_types()
            .iter()
            .map(|allergen| allergen.as_str().to_string())
            .collect();
        let drafts = build_item_drafts(&items, &detection);

        info!(
            items = items.len(),
            drafts = drafts.len(),
            "Menu analysis complete"
        );

        MenuAnalysis {
            items,
            detection,
            allergen_flags,
            drafts,
            taxonomy_version: self.tagger.taxonomy().version().to_string(),
            ocr_confidence: None,
            low_confidence: false,
        }
    }
}

/// Pair each item with the allergens detected for its name
///
/// Lookup is by exact name and takes the first flagged entry, so items sharing
/// a name share the first one's allergens.
pub fn build_item_drafts(
    items: &[ParsedMenuItem],
    detection: &AllergenDetectionResult,
) -> Vec<MenuItemDraft> {
    items
        .iter()
        .filter(|item| !item.name.is_empty())
        .map(|item| MenuItemDraft {
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price,
            category: item.category.clone(),
            detected_allergens: detection
                .allergens_for_item(&item.name)
                .map(<[AllergenType]>::to_vec)
                .unwrap_or_default(),
            tags: Vec::new(),
            is_available: true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_config_validation() {
        assert!(AnalysisConfig::default().validate().is_ok());
        assert!(AnalysisConfig {
            min_ocr_confidence: 1.01
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_analyze_flags_low_confidence() {
        let analyzer = MenuAnalyzer::default();
        let analysis = analyzer
            .analyze(&OcrResult::new("Soup - $5.00\nwith cream", 0.3))
            .unwrap();
        assert!(analysis.low_confidence);
        assert_eq!(analysis.ocr_confidence, Some(0.3));
        assert_eq!(analysis.allergen_flags, vec!["dairy".to_string()]);
    }

    #[test]
    fn test_analyze_rejects_invalid_confidence() {
        let analyzer = MenuAnalyzer::default();
        assert!(matches!(
            analyzer.analyze(&OcrResult::new("Soup - $5.00", 3.0)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_drafts_cover_every_item() {
        let analyzer = MenuAnalyzer::default();
        let analysis = analyzer.analyze_text("SIDES\nSteamed Broccoli - $4.00\nLightly seasoned\nFries - $3.50");
        assert_eq!(analysis.drafts.len(), 2);
        assert!(analysis.drafts.iter().all(|d| d.detected_allergens.is_empty()));
        assert!(analysis.drafts.iter().all(|d| d.is_available && d.tags.is_empty()));
        assert_eq!(analysis.drafts[0].category, "SIDES");
    }

    #[test]
    fn test_drafts_with_shared_names_use_first_entry() {
        let items = vec![
            ParsedMenuItem {
                name: "Special".to_string(),
                description: "shrimp".to_string(),
                price: Some(10.0),
                category: String::new(),
            },
            ParsedMenuItem {
                name: "Special".to_string(),
                description: "tofu".to_string(),
                price: Some(9.0),
                category: String::new(),
            },
        ];
        let detection = AllergenTagger::default().detect_for_items(&items);
        assert_eq!(detection.menu_items_with_allergens.len(), 2);

        let drafts = build_item_drafts(&items, &detection);
        assert_eq!(drafts[0].detected_allergens, vec![AllergenType::Seafood]);
        assert_eq!(drafts[1].detected_allergens, vec![AllergenType::Seafood]);
    }

    #[test]
    fn test_default_app_config_tags_late_description_lines() {
        let mut text = String::from("Chef Tasting - $95.00\n");
        for course in 0..60 {
            text.push_str(&format!("course {} with seasonal greens and herbs\n", course));
        }
        text.push_str("finished with crushed peanut brittle");

        let analyzer =
            MenuAnalyzer::from_app_config(&AppConfig::default(), AllergenTaxonomy::default())
                .unwrap();
        let analysis = analyzer.analyze_text(&text);
        assert!(analysis.items[0].description.len() > 2000);
        // "peanut" also contains the Nuts keyword "nut"
        assert_eq!(analysis.allergen_flags, vec!["nuts", "peanuts"]);
        assert!(analysis.drafts[0]
            .detected_allergens
            .contains(&AllergenType::Peanuts));
    }

    #[test]
    fn test_from_app_config_uses_configured_segmenter() {
        let mut config = AppConfig::default();
        config.segmenter.max_description_length = Some(1);
        let analyzer = MenuAnalyzer::from_app_config(&config, AllergenTaxonomy::default()).unwrap();
        let analysis = analyzer.analyze_text("Tea - $2.00\nplain\nwith lemon");
        assert_eq!(analysis.items[0].description, "plain ");
    }
}
