
#[cfg(test)]
mod tests {
    use super::test_helpers::{menu_item, DINNER_MENU, LUNCH_MENU};
    use menu_allergens::{
        AllergenTagger, AllergenTaxonomy, AllergenType, MatchMode, TaggerConfig,
        DEFAULT_CONFIDENCE,
    };
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::Arc;

    fn create_tagger() -> AllergenTagger {
        AllergenTagger::default()
    }

    #[test]
    fn test_positive_detection() {
        let tagger = create_tagger();
        let item = menu_item(
            "Fettuccine Alfredo",
            "Creamy parmesan sauce with fettuccine pasta",
        );
        let result = tagger.detect_for_items(&[item]);

        let dairy = result.find(AllergenType::Dairy).expect("dairy detected");
        assert!(dairy.mentions.contains(&"parmesan".to_string()));

        let gluten = result.find(AllergenType::Gluten).expect("gluten detected");
        assert!(
            gluten.mentions.contains(&"fettuccine".to_string())
                || gluten.mentions.contains(&"pasta".to_string())
        );

        assert_eq!(result.menu_items_with_allergens.len(), 1);
        assert_eq!(result.menu_items_with_allergens[0].item_name, "Fettuccine Alfredo");
    }

    #[test]
    fn test_negative_detection() {
        let tagger = create_tagger();
        let result = tagger.detect_for_items(&[menu_item("Steamed Broccoli", "Lightly seasoned")]);

        assert!(result.allergens.is_empty());
        assert!(result.menu_items_with_allergens.is_empty());
    }

    #[test]
    fn test_case_insensitive_mentions_use_taxonomy_form() {
        let tagger = create_tagger();
        for spelling in ["MILK", "milk", "Milk"] {
            let result = tagger.detect_for_items(&[menu_item("Shake", spelling)]);
            let dairy = result.find(AllergenType::Dairy).expect("dairy detected");
            assert_eq!(dairy.mentions, vec!["milk".to_string()], "input {}", spelling);
        }

        // Uppercase taxonomy keyword matches lowercase text and is reported as declared
        let result = tagger.detect_for_items(&[menu_item("Chili", "made with tvp")]);
        let soy = result.find(AllergenType::Soy).expect("soy detected");
        assert_eq!(soy.mentions, vec!["TVP".to_string()]);
    }

    #[test]
    fn test_substring_hits_inside_longer_words() {
        let tagger = create_tagger();
        let types = tagger.detect_item(&menu_item("Maple Roll", "rolled oats"));
        assert_eq!(types, vec![AllergenType::Gluten]);

        let types = tagger.detect_item(&menu_item("Spiced Cider", "with nutmeg"));
        assert_eq!(types, vec![AllergenType::Nuts]);
    }

    #[test]
    fn test_whole_word_mode_is_opt_in() {
        let config = TaggerConfig {
            match_mode: MatchMode::WholeWord,
            ..Default::default()
        };
        let tagger = AllergenTagger::with_config(AllergenTaxonomy::default(), config).unwrap();
        assert!(tagger
            .detect_item(&menu_item("Spiced Cider", "with nutmeg"))
            .is_empty());
        assert_eq!(
            tagger.detect_item(&menu_item("Brittle", "crushed peanuts")),
            vec![AllergenType::Peanuts]
        );
    }

    #[test]
    fn test_lunch_menu_detection() {
        let tagger = create_tagger();
        let result = tagger.detect(LUNCH_MENU);

        assert_eq!(
            result.allergen_types(),
            vec![
                AllergenType::Dairy,
                AllergenType::Gluten,
                AllergenType::Wheat,
                AllergenType::Seafood,
            ]
        );
        assert_eq!(
            result.find(AllergenType::Dairy).unwrap().mentions,
            vec!["butter", "mozzarella", "cheese", "blue cheese", "cream", "parmesan", "cheddar"]
        );
        assert_eq!(
            result.allergens_for_item("Garlic Bread"),
            Some(&[AllergenType::Dairy, AllergenType::Gluten, AllergenType::Wheat][..])
        );
        assert_eq!(
            result.allergens_for_item("Grilled Salmon"),
            Some(&[AllergenType::Seafood][..])
        );
        assert_eq!(
            result.allergens_for_item("Cheeseburger"),
            Some(&[AllergenType::Dairy][..])
        );
        assert!(result
            .allergens
            .iter()
            .all(|m| m.confidence == DEFAULT_CONFIDENCE));
    }

    #[test]
    fn test_long_description_keeps_trailing_allergens() {
        let tagger = create_tagger();
        let mut text = String::from("Chef Tasting - $95.00\n");
        for course in 0..60 {
            text.push_str(&format!("course {} with seasonal greens and herbs\n", course));
        }
        text.push_str("finished with crushed peanut brittle");

        let result = tagger.detect(&text);
        assert!(result.contains(AllergenType::Peanuts));
        assert!(result
            .allergens_for_item("Chef Tasting")
            .unwrap()
            .contains(&AllergenType::Peanuts));
    }

    #[test]
    fn test_dinner_menu_detection() {
        let tagger = create_tagger();
        let result = tagger.detect(DINNER_MENU);

        assert_eq!(
            result.allergens_for_item("Vegetable Stir Fry"),
            Some(&[AllergenType::Soy][..])
        );
        assert!(result
            .allergens_for_item("Chocolate Cake")
            .unwrap()
            .contains(&AllergenType::Dairy));
        assert!(result
            .allergens_for_item("Chicken Parmesan")
            .unwrap()
            .contains(&AllergenType::Gluten));
        assert_eq!(result.allergens_for_item("Filet Mignon"), None);
    }

    #[test]
    fn test_unsegmented_scan_matches_aggregate_types() {
        let tagger = create_tagger();
        let unsegmented = tagger.detect_unsegmented("Grilled Salmon with a side of tofu");
        assert_eq!(
            unsegmented.allergen_types(),
            vec![AllergenType::Seafood, AllergenType::Soy]
        );
        assert!(unsegmented.menu_items_with_allergens.is_empty());
    }

    #[test]
    fn test_detection_is_deterministic() {
        let tagger = create_tagger();
        let first = tagger.detect(DINNER_MENU);
        for _ in 0..5 {
            assert_eq!(tagger.detect(DINNER_MENU), first);
        }
    }

    #[test]
    fn test_items_sharing_a_name_are_not_deduplicated() {
        let tagger = create_tagger();
        let result = tagger.detect_for_items(&[
            menu_item("Chef's Special", "shrimp"),
            menu_item("Chef's Special", "shrimp"),
        ]);
        assert_eq!(result.menu_items_with_allergens.len(), 2);
        assert_eq!(result.allergens.len(), 1);
        assert_eq!(result.allergens[0].mentions, vec!["shrimp".to_string()]);
    }

    /// Menu text assembled from random taxonomy keywords and filler
    fn random_menu(rng: &mut StdRng, fragments: &[String]) -> String {
        let filler = ["served warm", "house special", "SEASONAL", "with herbs", "  ", "ask server"];
        let mut text = String::new();
        for _ in 0..rng.random_range(0..12) {
            match rng.random_range(0..4) {
                0 => text.push_str("STARTERS"),
                1 => text.push_str(&format!(
                    "{} Plate - ${}.{:02}",
                    fragments[rng.random_range(0..fragments.len())],
                    rng.random_range(1..40),
                    rng.random_range(0..100)
                )),
                2 => text.push_str(&fragments[rng.random_range(0..fragments.len())]),
                _ => text.push_str(filler[rng.random_range(0..filler.len())]),
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_aggregate_is_superset_of_item_allergens() {
        let taxonomy = AllergenTaxonomy::default();
        let fragments: Vec<String> = taxonomy
            .entries()
            .iter()
            .flat_map(|entry| entry.keywords.iter().cloned())
            .chain(["Broccoli".to_string(), "rice".to_string()])
            .collect();
        let tagger = AllergenTagger::new(taxonomy);
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..300 {
            let text = random_menu(&mut rng, &fragments);
            let result = tagger.detect(&text);
            for entry in &result.menu_items_with_allergens {
                for allergen in &entry.allergens {
                    assert!(
                        result.contains(*allergen),
                        "{} missing from aggregate for menu {:?}",
                        allergen,
                        text
                    );
                }
            }
            let mut seen = std::collections::HashSet::new();
            assert!(result.allergens.iter().all(|m| seen.insert(m.allergen_type)));
        }
    }

    #[test]
    fn test_tagger_shared_across_threads() {
        let tagger = Arc::new(create_tagger());
        let expected = tagger.detect(LUNCH_MENU);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let tagger = Arc::clone(&tagger);
                std::thread::spawn(move || tagger.detect(LUNCH_MENU))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }
}
