//! Matching detection results against a customer's allergen restrictions.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::allergen_info::display_name;
use crate::allergen_tagger::AllergenDetectionResult;
use crate::localization::t_args_lang;
use crate::taxonomy::AllergenType;

/// Allergen restrictions as stored on a customer profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DietaryProfile {
    #[serde(default)]
    pub allergen_restrictions: Vec<String>,
    #[serde(default)]
    pub language_code: Option<String>,
}

/// A flagged item that conflicts with the profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestrictionAlert {
    pub item_name: String,
    pub conflicts: Vec<AllergenType>,
    pub message: String,
}

impl DietaryProfile {
    pub fn new(restrictions: &[&str]) -> Self {
        Self {
            allergen_restrictions: restrictions.iter().map(|r| r.to_string()).collect(),
            language_code: None,
        }
    }

    /// Restrictions that name a known allergen type; others are skipped
    pub fn restricted_allergens(&self) -> Vec<AllergenType> {
        let mut restricted = Vec::new();
        for raw in &self.allergen_restrictions {
            match raw.parse::<AllergenType>() {
                Ok(allergen) if !restricted.contains(&allergen) => restricted.push(allergen),
                Ok(_) => {}
                Err(_) => debug!("Ignoring unrecognized allergen restriction '{}'", raw),
            }
        }
        restricted
    }

    /// One alert per flagged item that contains a restricted allergen
    pub fn flag_items(&self, detection: &AllergenDetectionResult) -> Vec<RestrictionAlert> {
        let restricted = self.restricted_allergens();
        if restricted.is_empty() {
            return Vec::new();
        }
        let language = self.language_code.as_deref();

        detection
            .menu_items_with_allergens
            .iter()
            .filter_map(|entry| {
                let conflicts: Vec<AllergenType> = entry
                    .allergens
                    .iter()
                    .copied()
                    .filter(|allergen| restricted.contains(allergen))
                    .collect();
                if conflicts.is_empty() {
                    return None;
                }
                let names = conflicts
                    .iter()
                    .map(|allergen| display_name(*allergen, language))
                    .collect::<Vec<_>>()
                    .join(", ");
                let message = t_args_lang(
                    "restriction-alert",
                    &[("item", entry.item_name.as_str()), ("allergens", names.as_str())],
                    language,
                );
                Some(RestrictionAlert {
                    item_name: entry.item_name.clone(),
                    conflicts,
                    message,
                })
            })
            .collect()
    }
}
