//! # Allergen Tagging Module
//!
//! Scans menu items against an [`AllergenTaxonomy`] and reports which allergen
//! types each item mentions, plus an aggregate view across the whole menu.
//!
//! ## Matching
//!
//! The default [`MatchMode::Substring`] mode lowercases the haystack and counts
//! a keyword as a hit wherever it occurs, including inside longer words
//! (`"nut"` hits `"nutmeg"`, `"roll"` hits `"rolled"`). [`MatchMode::WholeWord`]
//! is an opt-in mode that only accepts hits bounded by non-alphanumeric
//! characters; it flags fewer items and is never selected implicitly.
//!
//! Confidence is the constant [`DEFAULT_CONFIDENCE`] (or the configured
//! value) for every match. It is not a statistical estimate.

use crate::errors::{AppError, AppResult};
use crate::menu_segmenter::{MenuSegmenter, ParsedMenuItem};
use crate::taxonomy::{AllergenTaxonomy, AllergenType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, trace};

/// Confidence reported for every keyword-based match
pub const DEFAULT_CONFIDENCE: f64 = 0.9;

/// Aggregate detection for one allergen type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllergenMatch {
    #[serde(rename = "type")]
    pub allergen_type: AllergenType,
    pub confidence: f64,
    /// Taxonomy keywords that hit, as declared in the taxonomy, without duplicates
    pub mentions: Vec<String>,
}

/// Allergen types found in one menu item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAllergens {
    pub item_name: String,
    pub allergens: Vec<AllergenType>,
}

/// Output of an allergen scan
///
/// Every type listed under `menu_items_with_allergens` also appears in
/// `allergens`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergenDetectionResult {
    /// One entry per detected type, in first-detected order
    pub allergens: Vec<AllergenMatch>,
    /// Flagged items in input order
    pub menu_items_with_allergens: Vec<ItemAllergens>,
}

impl AllergenDetectionResult {
    pub fn is_empty(&self) -> bool {
        self.allergens.is_empty() && self.menu_items_with_allergens.is_empty()
    }

    /// Detected types in first-detected order
    pub fn allergen_types(&self) -> Vec<AllergenType> {
        self.allergens.iter().map(|m| m.allergen_type).collect()
    }

    pub fn contains(&self, allergen: AllergenType) -> bool {
        self.allergens.iter().any(|m| m.allergen_type == allergen)
    }

    pub fn find(&self, allergen: AllergenType) -> Option<&AllergenMatch> {
        self.allergens.iter().find(|m| m.allergen_type == allergen)
    }

    /// Allergens of the first flagged item with this exact name
    pub fn allergens_for_item(&self, item_name: &str) -> Option<&[AllergenType]> {
        self.menu_items_with_allergens
            .iter()
            .find(|entry| entry.item_name == item_name)
            .map(|entry| entry.allergens.as_slice())
    }

    fn record_hits(&mut self, allergen: AllergenType, mentions: &[&str], confidence: f64) {
        match self
            .allergens
            .iter_mut()
            .find(|m| m.allergen_type == allergen)
        {
            Some(existing) => {
                for mention in mentions {
                    if !existing.mentions.iter().any(|m| m == mention) {
                        existing.mentions.push(mention.to_string());
                    }
                }
            }
            None => {
                let mut unique: Vec<String> = Vec::with_capacity(mentions.len());
                for mention in mentions {
                    if !unique.iter().any(|m| m == mention) {
                        unique.push(mention.to_string());
                    }
                }
                self.allergens.push(AllergenMatch {
                    allergen_type: allergen,
                    confidence,
                    mentions: unique,
                });
            }
        }
    }
}

/// How keywords are matched against text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Case-insensitive containment anywhere in the text
    #[default]
    Substring,
    /// Case-insensitive containment bounded by non-alphanumeric characters
    WholeWord,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Substring => f.write_str("substring"),
            MatchMode::WholeWord => f.write_str("whole_word"),
        }
    }
}

impl FromStr for MatchMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "substring" => Ok(MatchMode::Substring),
            "whole_word" | "whole-word" | "wholeword" => Ok(MatchMode::WholeWord),
            other => Err(AppError::Config(format!(
                "unknown match mode '{}', expected 'substring' or 'whole_word'",
                other
            ))),
        }
    }
}

/// Configuration options for allergen tagging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggerConfig {
    /// Confidence attached to every match
    pub confidence: f64,
    pub match_mode: MatchMode,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            confidence: DEFAULT_CONFIDENCE,
            match_mode: MatchMode::Substring,
        }
    }
}

impl TaggerConfig {
    /// Validate tagging configuration parameters
    pub fn validate(&self) -> AppResult<()> {
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(AppError::Config(format!(
                "confidence must be within [0, 1], got {}",
                self.confidence
            )));
        }
        Ok(())
    }
}

/// Keyword-based allergen tagger over an injected taxonomy
#[derive(Debug, Clone)]
pub struct AllergenTagger {
    taxonomy: AllergenTaxonomy,
    config: TaggerConfig,
    segmenter: MenuSegmenter,
}

impl Default for AllergenTagger {
    fn default() -> Self {
        Self::new(AllergenTaxonomy::default())
    }
}

impl AllergenTagger {
    /// Create a tagger with the default configuration
    pub fn new(taxonomy: AllergenTaxonomy) -> Self {
        Self {
            taxonomy,
            config: TaggerConfig::default(),
            segmenter: MenuSegmenter::new(),
        }
    }

    /// Create a tagger with custom configuration
    pub fn with_config(taxonomy: AllergenTaxonomy, config: TaggerConfig) -> AppResult<Self> {
        config.validate()?;
        info!(
            taxonomy_version = %taxonomy.version(),
            confidence = config.confidence,
            match_mode = %config.match_mode,
            "Creating AllergenTagger with custom config"
        );
        Ok(Self {
            taxonomy,
            config,
            segmenter: MenuSegmenter::new(),
        })
    }

    /// Replace the segmenter used by [`AllergenTagger::detect`]
    pub fn with_segmenter(mut self, segmenter: MenuSegmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn taxonomy(&self) -> &AllergenTaxonomy {
        &self.taxonomy
    }

    pub fn config(&self) -> &TaggerConfig {
        &self.config
    }

    pub fn segmenter(&self) -> &MenuSegmenter {
        &self.segmenter
    }

    /// Segment raw menu text, then tag every recovered item
    ///
    /// ```rust
    /// use menu_allergens::allergen_tagger::AllergenTagger;
    /// use menu_allergens::taxonomy::AllergenType;
    ///
    /// let tagger = AllergenTagger::default();
    /// let result = tagger.detect("Garlic Bread - $5.99\nCrispy bread with garlic butter");
    /// assert_eq!(result.allergen_types(), vec![AllergenType::Dairy, AllergenType::Gluten, AllergenType::Wheat]);
    /// assert_eq!(result.menu_items_with_allergens[0].item_name, "Garlic Bread");
    /// ```
    pub fn detect(&self, raw_text: &str) -> AllergenDetectionResult {
        let items = self.segmenter.segment(raw_text);
        self.detect_for_items(&items)
    }

    /// Tag each item and aggregate the hits
    pub fn detect_for_items(&self, items: &[ParsedMenuItem]) -> AllergenDetectionResult {
        let start_time = std::time::Instant::now();
        let mut result = AllergenDetectionResult::default();

        for item in items {
            let haystack = format!("{} {}", item.name, item.description).to_lowercase();
            let hits = self.scan(&haystack);
            if hits.is_empty() {
                trace!("No allergens in '{}'", item.name);
                continue;
            }

            let mut item_allergens = Vec::with_capacity(hits.len());
            for (allergen, mentions) in &hits {
                result.record_hits(*allergen, mentions, self.config.confidence);
                item_allergens.push(*allergen);
            }
            debug!(item = %item.name, allergens = ?item_allergens, "Tagged menu item");
            result.menu_items_with_allergens.push(ItemAllergens {
                item_name: item.name.clone(),
                allergens: item_allergens,
            });
        }

        crate::observability::record_detection_metrics(
            "detect_for_items",
            start_time.elapsed(),
            items.len(),
            result.menu_items_with_allergens.len(),
            result.allergens.len(),
        );
        info!(
            items = items.len(),
            flagged_items = result.menu_items_with_allergens.len(),
            allergen_types = result.allergens.len(),
            "Allergen detection complete"
        );
        result
    }

    /// Scan the whole text as one haystack, without recovering items
    ///
    /// `menu_items_with_allergens` is always empty.
    pub fn detect_unsegmented(&self, text: &str) -> AllergenDetectionResult {
        let start_time = std::time::Instant::now();
        let mut result = AllergenDetectionResult::default();

        let haystack = text.to_lowercase();
        for (allergen, mentions) in self.scan(&haystack) {
            result.record_hits(allergen, &mentions, self.config.confidence);
        }

        crate::observability::record_detection_metrics(
            "detect_unsegmented",
            start_time.elapsed(),
            0,
            0,
            result.allergens.len(),
        );
        debug!(
            allergen_types = result.allergens.len(),
            "Unsegmented allergen scan complete"
        );
        result
    }

    /// Allergen types present in a single item, in taxonomy order
    pub fn detect_item(&self, item: &ParsedMenuItem) -> Vec<AllergenType> {
        let haystack = format!("{} {}", item.name, item.description).to_lowercase();
        self.scan(&haystack)
            .into_iter()
            .map(|(allergen, _)| allergen)
            .collect()
    }

    /// Taxonomy-ordered hits as `(type, declared keywords)`; types without hits are omitted
    fn scan<'t>(&'t self, lowered_haystack: &str) -> Vec<(AllergenType, Vec<&'t str>)> {
        let mut hits = Vec::new();
        for entry in self.taxonomy.entries() {
            let mentions: Vec<&str> = entry
                .keyword_pairs()
                .filter(|(_, lowered)| self.keyword_hits(lowered_haystack, lowered))
                .map(|(declared, _)| declared)
                .collect();
            if !mentions.is_empty() {
                hits.push((entry.allergen, mentions));
            }
        }
        hits
    }

    fn keyword_hits(&self, haystack: &str, keyword: &str) -> bool {
        match self.config.match_mode {
            MatchMode::Substring => haystack.contains(keyword),
            MatchMode::WholeWord => contains_whole_word(haystack, keyword),
        }
    }
}

fn contains_whole_word(haystack: &str, keyword: &str) -> bool {
    haystack.match_indices(keyword).any(|(start, matched)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + matched.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
