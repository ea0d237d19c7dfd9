use std::collections::HashSet;

use crate::catalog::repo::Ingredient;
use crate::recommend::normalize::normalize_name;

/// Map detected ingredient names onto catalog records.
///
/// The normalized detected-name set is built once, then the catalog is
/// walked in a single pass — O(detected + catalog), not O(detected × catalog).
/// Catalog ingredients whose normalized names collide are all returned.
/// An empty result is a valid outcome, not an error.
pub fn match_ingredients(detected: &[String], catalog: &[Ingredient]) -> Vec<Ingredient> {
    let wanted: HashSet<String> = detected
        .iter()
        .map(|name| normalize_name(name))
        .filter(|name| !name.is_empty())
        .collect();
    if wanted.is_empty() {
        return Vec::new();
    }

    catalog
        .iter()
        .filter(|ingredient| wanted.contains(&normalize_name(&ingredient.name)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingredient(id: &str, name: &str) -> Ingredient {
        Ingredient {
            id: id.into(),
            name: name.into(),
            unit: "g".into(),
            kind: "vegetable".into(),
            kcal: None,
            image_url: None,
        }
    }

    #[test]
    fn matches_through_normalization() {
        let catalog = vec![
            ingredient("1", "ca chua"),
            ingredient("2", "trung"),
            ingredient("3", "hanh tay"),
        ];
        let detected = vec!["Cà chua".to_string(), "Trứng".to_string()];
        let matched = match_ingredients(&detected, &catalog);
        let ids: Vec<&str> = matched.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn every_match_is_in_the_detected_set_and_none_are_omitted() {
        let catalog = vec![
            ingredient("1", "Thịt gà"),
            ingredient("2", "tỏi"),
            ingredient("3", "gừng"),
        ];
        let detected = vec![
            "thit ga".to_string(),
            "TOI".to_string(),
            "unknown thing".to_string(),
        ];
        let matched = match_ingredients(&detected, &catalog);

        let wanted: std::collections::HashSet<String> = detected
            .iter()
            .map(|n| normalize_name(n))
            .filter(|n| !n.is_empty())
            .collect();
        // soundness: every returned ingredient was asked for
        for m in &matched {
            assert!(wanted.contains(&normalize_name(&m.name)));
        }
        // completeness: nothing askable was dropped
        for c in &catalog {
            if wanted.contains(&normalize_name(&c.name)) {
                assert!(matched.iter().any(|m| m.id == c.id));
            }
        }
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn duplicate_normalized_catalog_names_are_both_returned() {
        let catalog = vec![ingredient("1", "Cà chua"), ingredient("2", "ca-chua")];
        let matched = match_ingredients(&["ca chua".to_string()], &catalog);
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn empty_or_garbage_input_matches_nothing() {
        let catalog = vec![ingredient("1", "ca chua")];
        assert!(match_ingredients(&[], &catalog).is_empty());
        assert!(match_ingredients(&["!!!".to_string()], &catalog).is_empty());
    }
}
