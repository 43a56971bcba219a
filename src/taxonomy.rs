//! # Allergen Taxonomy
//!
//! The closed set of allergen types and the keyword table used to detect them.
//! A taxonomy is immutable once built and is validated eagerly: a malformed
//! keyword (an empty string would match every haystack) is rejected when the
//! table is constructed, never at scan time.

use crate::errors::{error_logging, AppError, AppResult};
use lazy_static::lazy_static;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Allergen categories recognized by the tagger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllergenType {
    Dairy,
    Nuts,
    Gluten,
    Seafood,
    Soy,
    Eggs,
    Peanuts,
    Wheat,
}

impl AllergenType {
    /// All allergen types in taxonomy declaration order
    pub const ALL: [AllergenType; 8] = [
        AllergenType::Dairy,
        AllergenType::Nuts,
        AllergenType::Gluten,
        AllergenType::Seafood,
        AllergenType::Soy,
        AllergenType::Eggs,
        AllergenType::Peanuts,
        AllergenType::Wheat,
    ];

    /// Lowercase identifier, as stored in menu documents
    pub fn as_str(&self) -> &'static str {
        match self {
            AllergenType::Dairy => "dairy",
            AllergenType::Nuts => "nuts",
            AllergenType::Gluten => "gluten",
            AllergenType::Seafood => "seafood",
            AllergenType::Soy => "soy",
            AllergenType::Eggs => "eggs",
            AllergenType::Peanuts => "peanuts",
            AllergenType::Wheat => "wheat",
        }
    }
}

impl fmt::Display for AllergenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AllergenType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        AllergenType::ALL
            .iter()
            .copied()
            .find(|allergen| allergen.as_str() == wanted)
            .ok_or_else(|| AppError::Parse(format!("unknown allergen type '{}'", s)))
    }
}

/// Built-in keyword table, in declaration order
const DEFAULT_KEYWORDS: &[(AllergenType, &[&str])] = &[
    (
        AllergenType::Dairy,
        &[
            "milk", "cheese", "butter", "cream", "yogurt", "ice cream", "custard", "pudding",
            "whey", "casein", "lactose", "ghee", "curd", "kefir", "buttermilk", "sour cream",
            "parmesan", "mozzarella", "cheddar", "blue cheese", "ricotta", "brie", "feta",
        ],
    ),
    (
        AllergenType::Nuts,
        &[
            "almond", "walnut", "pecan", "cashew", "pistachio", "hazelnut", "macadamia",
            "pine nut", "brazil nut", "chestnut", "nut", "nuts", "nutty", "nut butter",
        ],
    ),
    (
        AllergenType::Gluten,
        &[
            "wheat", "barley", "rye", "oats", "bread", "pasta", "flour", "cereal", "couscous",
            "bulgur", "semolina", "farina", "durum", "kamut", "spelt", "triticale", "malt",
            "bun", "roll", "cracker", "pizza", "pastry", "cake", "cookie", "pie crust",
            "biscuit", "croissant", "bagel", "pretzel", "noodle", "spaghetti", "fettuccine",
        ],
    ),
    (
        AllergenType::Seafood,
        &[
            "fish", "salmon", "tuna", "cod", "halibut", "trout", "tilapia", "sardine", "anchovy",
            "shellfish", "shrimp", "prawn", "crab", "lobster", "clam", "mussel", "oyster",
            "scallop", "squid", "calamari", "octopus", "seafood", "fish sauce", "fish oil",
            "caviar", "roe",
        ],
    ),
    (
        AllergenType::Soy,
        &[
            "soy", "soya", "soybeans", "soy sauce", "tofu", "tempeh", "miso", "edamame",
            "soy milk", "soy protein", "soy lecithin", "textured vegetable protein", "TVP",
        ],
    ),
    (
        AllergenType::Eggs,
        &[
            "egg", "eggs", "yolk", "white", "albumin", "mayonnaise", "meringue", "custard",
            "eggnog", "quiche", "frittata", "omelet", "egg wash", "egg noodles",
        ],
    ),
    (
        AllergenType::Peanuts,
        &[
            "peanut", "peanuts", "peanut butter", "peanut oil", "groundnut", "arachis",
            "goober", "monkey nut", "beer nuts",
        ],
    ),
    (
        AllergenType::Wheat,
        &[
            "wheat", "flour", "bread", "pasta", "couscous", "bulgur", "semolina", "durum",
            "wheat germ", "wheat bran", "wheat starch", "wheat protein", "seitan",
        ],
    ),
];

/// Version tag of the built-in keyword table
pub const DEFAULT_TAXONOMY_VERSION: &str = "builtin-1";

lazy_static! {
    static ref DEFAULT_TAXONOMY: AllergenTaxonomy = AllergenTaxonomy::builtin();
}

/// Keyword list for one allergen type
#[derive(Debug, Clone, PartialEq)]
pub struct TaxonomyEntry {
    pub allergen: AllergenType,
    /// Keywords exactly as declared; these are reported as mentions
    pub keywords: Vec<String>,
    /// Lowercased keywords, index-aligned with `keywords`
    lowered: Vec<String>,
}

impl TaxonomyEntry {
    /// Iterate `(declared, lowercased)` keyword pairs
    pub fn keyword_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.keywords
            .iter()
            .map(String::as_str)
            .zip(self.lowered.iter().map(String::as_str))
    }
}

/// Immutable mapping from allergen type to its detection keywords
#[derive(Debug, Clone, PartialEq)]
pub struct AllergenTaxonomy {
    version: String,
    entries: Vec<TaxonomyEntry>,
}

impl Default for AllergenTaxonomy {
    fn default() -> Self {
        DEFAULT_TAXONOMY.clone()
    }
}

impl AllergenTaxonomy {
    fn builtin() -> Self {
        let entries = DEFAULT_KEYWORDS
            .iter()
            .map(|(allergen, keywords)| {
                Self::entry(*allergen, keywords.iter().map(|k| k.to_string()).collect())
            })
            .collect();
        Self {
            version: DEFAULT_TAXONOMY_VERSION.to_string(),
            entries,
        }
    }

    fn entry(allergen: AllergenType, keywords: Vec<String>) -> TaxonomyEntry {
        let lowered = keywords.iter().map(|k| k.to_lowercase()).collect();
        TaxonomyEntry {
            allergen,
            keywords,
            lowered,
        }
    }

    /// Build a custom taxonomy, validating every keyword list
    ///
    /// Entries keep the order they are given in; that order drives the scan
    /// order and therefore the order of detection results.
    pub fn new(entries: Vec<(AllergenType, Vec<String>)>) -> AppResult<Self> {
        Self::with_version("custom", entries)
    }

    /// Build a custom taxonomy carrying an explicit version tag
    pub fn with_version(
        version: impl Into<String>,
        entries: Vec<(AllergenType, Vec<String>)>,
    ) -> AppResult<Self> {
        Self::validate_entries(&entries)?;
        let taxonomy = Self {
            version: version.into(),
            entries: entries
                .into_iter()
                .map(|(allergen, keywords)| Self::entry(allergen, keywords))
                .collect(),
        };
        debug!(
            version = %taxonomy.version,
            allergen_types = taxonomy.entries.len(),
            keywords = taxonomy.keyword_count(),
            "Built allergen taxonomy"
        );
        Ok(taxonomy)
    }

    fn validate_entries(entries: &[(AllergenType, Vec<String>)]) -> AppResult<()> {
        if entries.is_empty() {
            return Err(AppError::Config(
                "taxonomy must declare at least one allergen type".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for (allergen, keywords) in entries {
            if !seen.insert(*allergen) {
                return Err(AppError::Config(format!(
                    "allergen type '{}' is declared more than once",
                    allergen
                )));
            }
            if keywords.is_empty() {
                return Err(AppError::Config(format!(
                    "keyword list for '{}' cannot be empty",
                    allergen
                )));
            }
            for (i, keyword) in keywords.iter().enumerate() {
                if keyword.trim().is_empty() {
                    return Err(AppError::Config(format!(
                        "{}[{}] cannot be empty",
                        allergen, i
                    )));
                }
                if keyword.chars().any(|c| c.is_control()) {
                    return Err(AppError::Config(format!(
                        "{}[{}] '{}' contains control characters",
                        allergen,
                        i,
                        keyword.escape_debug()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Parse a taxonomy from its JSON document form
    ///
    /// ```json
    /// { "version": "2024-05", "allergens": { "dairy": ["milk", "cheese"] } }
    /// ```
    ///
    /// Allergen types are arranged in declaration order whatever the key order
    /// of the document.
    pub fn from_json_str(content: &str) -> AppResult<Self> {
        let document: TaxonomyDocument = serde_json::from_str(content)?;

        let mut by_type: HashMap<AllergenType, Vec<String>> = HashMap::new();
        for (key, keywords) in document.allergens.0 {
            let allergen: AllergenType = key
                .parse()
                .map_err(|_| AppError::Config(format!("unknown allergen type '{}'", key)))?;
            if by_type.insert(allergen, keywords).is_some() {
                return Err(AppError::Config(format!(
                    "allergen type '{}' is declared more than once",
                    allergen
                )));
            }
        }

        let entries = AllergenType::ALL
            .iter()
            .filter_map(|allergen| by_type.remove(allergen).map(|keywords| (*allergen, keywords)))
            .collect();

        Self::with_version(document.version.unwrap_or_else(|| "unversioned".to_string()), entries)
    }

    /// Read and parse a taxonomy JSON file
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::Io(format!("failed to read '{}': {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }

    /// Serialize back to the JSON document form
    pub fn to_json_string(&self) -> AppResult<String> {
        let document = TaxonomyDocument {
            version: Some(self.version.clone()),
            allergens: KeywordTable(
                self.entries
                    .iter()
                    .map(|entry| (entry.allergen.as_str().to_string(), entry.keywords.clone()))
                    .collect(),
            ),
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn entries(&self) -> &[TaxonomyEntry] {
        &self.entries
    }

    /// Keywords declared for an allergen type, if the taxonomy covers it
    pub fn keywords(&self, allergen: AllergenType) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|entry| entry.allergen == allergen)
            .map(|entry| entry.keywords.as_slice())
    }

    pub fn allergen_types(&self) -> impl Iterator<Item = AllergenType> + '_ {
        self.entries.iter().map(|entry| entry.allergen)
    }

    pub fn keyword_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.keywords.len()).sum()
    }
}

/// On-disk taxonomy document
#[derive(Debug, Clone, Deserialize, Serialize)]
struct TaxonomyDocument {
    #[serde(default)]
    version: Option<String>,
    allergens: KeywordTable,
}

/// The `allergens` object as written, keys in document order with repeats kept
#[derive(Debug, Clone, Default)]
struct KeywordTable(Vec<(String, Vec<String>)>);

impl Serialize for KeywordTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, keywords) in &self.0 {
            map.serialize_entry(key, keywords)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for KeywordTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeywordTableVisitor;

        impl<'de> Visitor<'de> for KeywordTableVisitor {
            type Value = KeywordTable;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of allergen type to keyword list")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(pair) = access.next_entry::<String, Vec<String>>()? {
                    pairs.push(pair);
                }
                Ok(KeywordTable(pairs))
            }
        }

        deserializer.deserialize_map(KeywordTableVisitor)
    }
}

/// Load the allergen taxonomy from the environment or well-known paths
///
/// Lookup order: `ALLERGEN_TAXONOMY_PATH`, then `config/allergen_taxonomy.json`
/// and `../config/allergen_taxonomy.json`. When no file exists the built-in
/// table is used. A file that exists but fails validation is an error.
pub fn load_taxonomy() -> AppResult<AllergenTaxonomy> {
    if let Ok(config_path) = std::env::var("ALLERGEN_TAXONOMY_PATH") {
        info!(
            "Loading allergen taxonomy from environment variable: {}",
            config_path
        );
        return load_taxonomy_from(&config_path);
    }

    let possible_paths = [
        "config/allergen_taxonomy.json",    // Local development path
        "../config/allergen_taxonomy.json", // Test path
    ];

    for config_path in &possible_paths {
        if Path::new(config_path).is_file() {
            return load_taxonomy_from(config_path);
        }
    }

    warn!("No allergen taxonomy file found in any expected location. Using built-in taxonomy.");
    Ok(AllergenTaxonomy::default())
}

fn load_taxonomy_from(config_path: &str) -> AppResult<AllergenTaxonomy> {
    match AllergenTaxonomy::from_file(config_path) {
        Ok(taxonomy) => {
            info!(
                version = %taxonomy.version(),
                keywords = taxonomy.keyword_count(),
                "Successfully loaded allergen taxonomy from: {}",
                config_path
            );
            Ok(taxonomy)
        }
        Err(e) => {
            error_logging::log_taxonomy_error(&e, config_path, "load_taxonomy");
            Err(e)
        }
    }
}
