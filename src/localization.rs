use anyhow::{anyhow, Result};
use fluent_bundle::{FluentArgs, FluentBundle, FluentResource, FluentValue};
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::warn;
use unic_langid::LanguageIdentifier;

/// Fluent sources bundled into the library, keyed by language code
const LOCALE_SOURCES: &[(&str, &str)] = &[
    ("en", include_str!("../locales/en/main.ftl")),
    ("fr", include_str!("../locales/fr/main.ftl")),
];

/// Localization manager for allergen reference text
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl LocalizationManager {
    /// Create a new localization manager
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        for (locale_str, source) in LOCALE_SOURCES {
            let locale: LanguageIdentifier = locale_str.parse()?;
            let bundle = Self::create_bundle(&locale, source)?;
            bundles.insert(locale_str.to_string(), bundle);
        }

        Ok(Self { bundles })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(
        locale: &LanguageIdentifier,
        source: &str,
    ) -> Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new(vec![locale.clone()]);
        // Output goes to JSON and terminals, not bidi-aware UIs
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("invalid FTL for {}: {:?}", locale, errors))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("conflicting FTL messages for {}: {:?}", locale, errors))?;

        Ok(bundle)
    }

    /// Get a localized message in a specific language, falling back to English
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&[(&str, &str)]>,
    ) -> String {
        let bundle = match self.bundles.get(language).or_else(|| self.bundles.get("en")) {
            Some(bundle) => bundle,
            None => return format!("Missing translation: {}", key),
        };

        let msg = match bundle.get_message(key) {
            Some(msg) => msg,
            None => return format!("Missing translation: {}", key),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {}", key),
        };

        let fluent_args = args.map(|args| {
            FluentArgs::from_iter(args.iter().map(|(k, v)| (*k, FluentValue::from(*v))))
        });

        let mut errors = vec![];
        let value = bundle.format_pattern(pattern, fluent_args.as_ref(), &mut errors);
        if !errors.is_empty() {
            warn!(key = %key, language = %language, errors = ?errors, "Fluent formatting errors");
        }
        value.into_owned()
    }

    /// Check if a language is supported
    pub fn is_language_supported(&self, language: &str) -> bool {
        self.bundles.contains_key(language)
    }
}

thread_local! {
    static LOCALIZATION_MANAGER: RefCell<Option<LocalizationManager>> = const { RefCell::new(None) };
}

/// Run `f` with this thread's localization manager, creating it on first use
///
/// Returns `None` when the bundled resources could not be loaded.
fn with_localization_manager<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&LocalizationManager) -> R,
{
    LOCALIZATION_MANAGER.with(|cell| {
        if cell.borrow().is_none() {
            match LocalizationManager::new() {
                Ok(manager) => *cell.borrow_mut() = Some(manager),
                Err(e) => {
                    warn!(error = %e, "Localization manager could not be created");
                    return None;
                }
            }
        }
        cell.borrow().as_ref().map(f)
    })
}

/// Convenience function to get a localized message
pub fn t_lang(key: &str, language_code: Option<&str>) -> String {
    let language = detect_language(language_code);
    with_localization_manager(|manager| manager.get_message_in_language(key, &language, None))
        .unwrap_or_else(|| format!("Missing translation: {}", key))
}

/// Convenience function to get a localized message with arguments
pub fn t_args_lang(key: &str, args: &[(&str, &str)], language_code: Option<&str>) -> String {
    let language = detect_language(language_code);
    with_localization_manager(|manager| {
        manager.get_message_in_language(key, &language, Some(args))
    })
    .unwrap_or_else(|| format!("Missing translation: {}", key))
}

/// Reduce a language tag to a supported language code, defaulting to English
pub fn detect_language(language_code: Option<&str>) -> String {
    if let Some(code) = language_code {
        // "fr-FR" -> "fr", "en_US" -> "en"
        let lang = code
            .split(['-', '_'])
            .next()
            .unwrap_or("en")
            .to_lowercase();

        let supported =
            with_localization_manager(|manager| manager.is_language_supported(&lang))
                .unwrap_or(false);
        if supported {
            return lang;
        }
    }

    "en".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_resources_load() {
        let manager = LocalizationManager::new().unwrap();
        assert!(manager.is_language_supported("en"));
        assert!(manager.is_language_supported("fr"));
        assert!(!manager.is_language_supported("de"));
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language(Some("fr-FR")), "fr");
        assert_eq!(detect_language(Some("en_US")), "en");
        assert_eq!(detect_language(Some("de")), "en");
        assert_eq!(detect_language(None), "en");
    }

    #[test]
    fn test_messages_and_fallbacks() {
        assert_eq!(t_lang("allergen-soy-name", Some("fr")), "Soja");
        assert_eq!(t_lang("allergen-soy-name", Some("de")), "Soy");
        assert_eq!(t_lang("no-such-key", None), "Missing translation: no-such-key");
        assert_eq!(
            t_args_lang(
                "restriction-alert",
                &[("item", "Pad Thai"), ("allergens", "Peanuts")],
                Some("en")
            ),
            "Pad Thai contains Peanuts"
        );
    }
}
