//! Reference information about each allergen type, for display next to tags.

use serde::{Deserialize, Serialize};

use crate::localization::t_lang;
use crate::taxonomy::AllergenType;

/// Human-facing description of an allergen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergenInfo {
    pub allergen: AllergenType,
    pub name: String,
    pub description: String,
    pub common_foods: Vec<String>,
}

fn common_foods(allergen: AllergenType) -> &'static [&'static str] {
    match allergen {
        AllergenType::Dairy => &["Milk", "Cheese", "Yogurt", "Butter", "Ice cream", "Cream", "Custard"],
        AllergenType::Nuts => &[
            "Almonds", "Walnuts", "Cashews", "Pistachios", "Hazelnuts", "Pecans", "Macadamia nuts",
        ],
        AllergenType::Gluten => &[
            "Bread", "Pasta", "Cereal", "Beer", "Crackers", "Baked goods", "Some sauces and gravies",
        ],
        AllergenType::Seafood => &["Fish", "Shrimp", "Crab", "Lobster", "Clams", "Mussels", "Oysters"],
        AllergenType::Soy => &[
            "Tofu", "Soy milk", "Soy sauce", "Edamame", "Miso", "Tempeh", "Many processed foods",
        ],
        AllergenType::Eggs => &[
            "Eggs", "Mayonnaise", "Meringue", "Some baked goods", "Custards", "Some pasta",
        ],
        AllergenType::Wheat => &[
            "Bread", "Pasta", "Cereal", "Crackers", "Baked goods", "Beer", "Some sauces",
        ],
        AllergenType::Peanuts => &[
            "Peanuts", "Peanut butter", "Many candies", "Some baked goods", "Some Asian cuisine",
        ],
    }
}

/// Localized display name, e.g. `"Tree Nuts"` for [`AllergenType::Nuts`]
pub fn display_name(allergen: AllergenType, language_code: Option<&str>) -> String {
    t_lang(&format!("allergen-{}-name", allergen), language_code)
}

/// Reference information for one allergen, localized where available
///
/// Common food examples are English only.
pub fn allergen_info(allergen: AllergenType, language_code: Option<&str>) -> AllergenInfo {
    AllergenInfo {
        allergen,
        name: display_name(allergen, language_code),
        description: t_lang(&format!("allergen-{}-description", allergen), language_code),
        common_foods: common_foods(allergen).iter().map(|f| f.to_string()).collect(),
    }
}
