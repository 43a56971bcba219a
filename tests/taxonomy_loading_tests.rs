#[cfg(test)]
mod tests {
    use menu_allergens::taxonomy::{load_taxonomy, AllergenTaxonomy, AllergenType};
    use menu_allergens::{AllergenTagger, AppError};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp file");
        file.write_all(content.as_bytes()).expect("write temp file");
        file
    }

    #[test]
    fn test_shipped_taxonomy_matches_builtin() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/allergen_taxonomy.json");
        let shipped = AllergenTaxonomy::from_file(path).unwrap();
        assert_eq!(shipped, AllergenTaxonomy::default());
    }

    #[test]
    fn test_custom_taxonomy_file_drives_tagging() {
        let file = write_temp(
            r#"{ "version": "test-2", "allergens": { "seafood": ["kelp"], "soy": ["natto"] } }"#,
        );
        let taxonomy = AllergenTaxonomy::from_file(file.path()).unwrap();
        assert_eq!(taxonomy.version(), "test-2");

        let tagger = AllergenTagger::new(taxonomy);
        let result = tagger.detect("Natto Bowl - $9.00\nwith kelp and salmon");
        // "salmon" is not in this taxonomy
        assert_eq!(
            result.allergen_types(),
            vec![AllergenType::Seafood, AllergenType::Soy]
        );
        assert_eq!(result.allergens[0].mentions, vec!["kelp".to_string()]);
    }

    #[test]
    fn test_empty_keyword_rejected_at_load_time() {
        let file = write_temp(r#"{ "allergens": { "dairy": ["milk", " "] } }"#);
        assert!(matches!(
            AllergenTaxonomy::from_file(file.path()),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            AllergenTaxonomy::from_file("/definitely/not/here.json"),
            Err(AppError::Io(_))
        ));
    }

    #[test]
    fn test_load_taxonomy_from_environment() {
        let file = write_temp(r#"{ "version": "env", "allergens": { "eggs": ["aioli"] } }"#);
        std::env::set_var("ALLERGEN_TAXONOMY_PATH", file.path());
        let loaded = load_taxonomy();
        std::env::remove_var("ALLERGEN_TAXONOMY_PATH");

        let taxonomy = loaded.unwrap();
        assert_eq!(taxonomy.version(), "env");
        assert_eq!(taxonomy.keywords(AllergenType::Eggs), Some(&["aioli".to_string()][..]));
        assert_eq!(taxonomy.keywords(AllergenType::Dairy), None);
    }
}
