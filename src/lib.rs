//! # menu-allergens
//!
//! Turns raw OCR text of a restaurant menu into categorized menu items and
//! tags each item with the allergens its name and description mention.
//!
//! ```rust
//! use menu_allergens::{AllergenTagger, AllergenType, MenuSegmenter};
//!
//! let text = "MAIN COURSES\nFettuccine Alfredo - $14.99\nCreamy parmesan sauce with fettuccine pasta";
//! let items = MenuSegmenter::new().segment(text);
//! let result = AllergenTagger::default().detect_for_items(&items);
//! assert!(result.contains(AllergenType::Dairy));
//! assert!(result.contains(AllergenType::Gluten));
//! ```

pub mod allergen_info;
pub mod allergen_tagger;
pub mod config;
pub mod dietary;
pub mod errors;
pub mod localization;
pub mod menu_analysis;
pub mod menu_segmenter;
pub mod observability;
pub mod observability_config;
pub mod ocr;
pub mod taxonomy;

// Re-export types for easier access
pub use allergen_tagger::{
    AllergenDetectionResult, AllergenMatch, AllergenTagger, ItemAllergens, MatchMode,
    TaggerConfig, DEFAULT_CONFIDENCE,
};
pub use errors::{AppError, AppResult};
pub use menu_analysis::{MenuAnalysis, MenuAnalyzer, MenuItemDraft};
pub use menu_segmenter::{segment_menu, MenuSection, MenuSegmenter, ParsedMenuItem};
pub use ocr::OcrResult;
pub use taxonomy::{AllergenTaxonomy, AllergenType};
