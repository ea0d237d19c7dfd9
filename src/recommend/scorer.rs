use std::cmp::Ordering;
use std::collections::HashSet;

use crate::meals::repo::{DietType, Meal};
use crate::recommend::normalize::canonical_id;

/// Default cap on ranked results.
pub const DEFAULT_RANK_LIMIT: usize = 50;

/// Number of matched ingredients a meal shares with the detected set.
/// Both sides are compared through their canonical string forms.
pub fn overlap_score(meal: &Meal, matched_ids: &HashSet<String>) -> usize {
    meal.ingredient_ids
        .iter()
        .filter(|id| matched_ids.contains(&canonical_id(id)))
        .count()
}

/// Rank a candidate pool by ingredient overlap.
///
/// With a non-empty matched set, only meals sharing at least one ingredient
/// remain. With an empty matched set there is no ingredient signal: every
/// meal stays at score 0 and the rating tie-break decides. Sort is score
/// descending, then rating descending, then stable (pool order). Output is
/// truncated to `limit`.
pub fn rank(pool: Vec<Meal>, matched_ids: &HashSet<String>, limit: usize) -> Vec<Meal> {
    let mut scored: Vec<(usize, Meal)> = pool
        .into_iter()
        .filter_map(|meal| {
            let score = overlap_score(&meal, matched_ids);
            if matched_ids.is_empty() || score > 0 {
                Some((score, meal))
            } else {
                None
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.0.cmp(&a.0).then_with(|| {
            b.1.rating
                .partial_cmp(&a.1.rating)
                .unwrap_or(Ordering::Equal)
        })
    });

    scored.into_iter().take(limit).map(|(_, meal)| meal).collect()
}

/// Diet-filter relaxation policy, kept separate from the scoring core so it
/// can be tuned without touching it: retry without the diet restriction only
/// when the filtered pool produced nothing AND there were ingredient matches.
pub fn should_relax_diet_filter(filtered_empty: bool, has_matches: bool) -> bool {
    filtered_empty && has_matches
}

/// Diet type implied by a BMI value, for the image-recommendation path.
pub fn diet_type_from_bmi(bmi: f64) -> Option<DietType> {
    if !bmi.is_finite() || bmi <= 0.0 {
        return None;
    }
    Some(if bmi < 18.5 {
        DietType::WeightGain
    } else if bmi >= 25.0 {
        DietType::WeightLoss
    } else {
        DietType::EatClean
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn meal(name: &str, ingredient_ids: &[&str], rating: f32) -> Meal {
        Meal {
            id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            ingredient_ids: ingredient_ids.iter().map(|s| s.to_string()).collect(),
            instructions: vec![],
            image_url: None,
            category_id: Uuid::new_v4(),
            sub_category_id: Uuid::new_v4(),
            diet_type: DietType::EatClean,
            total_kcal: 400,
            tags: vec![],
            meal_times: vec!["lunch".into()],
            rating,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn matched(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| canonical_id(s)).collect()
    }

    #[test]
    fn more_overlap_ranks_first() {
        let pool = vec![
            meal("one shared", &["ca chua", "hanh"], 5.0),
            meal("two shared", &["ca chua", "trung"], 1.0),
        ];
        let ranked = rank(pool, &matched(&["ca chua", "trung"]), DEFAULT_RANK_LIMIT);
        assert_eq!(ranked[0].name, "two shared");
        assert_eq!(ranked[1].name, "one shared");
    }

    #[test]
    fn rating_breaks_score_ties() {
        let pool = vec![
            meal("low rated", &["a"], 2.0),
            meal("high rated", &["a"], 4.5),
        ];
        let ranked = rank(pool, &matched(&["a"]), DEFAULT_RANK_LIMIT);
        assert_eq!(ranked[0].name, "high rated");
    }

    #[test]
    fn full_ties_keep_pool_order() {
        let pool = vec![
            meal("first", &["a"], 3.0),
            meal("second", &["a"], 3.0),
            meal("third", &["a"], 3.0),
        ];
        let ranked = rank(pool, &matched(&["a"]), DEFAULT_RANK_LIMIT);
        let names: Vec<&str> = ranked.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn non_overlapping_meals_are_dropped_when_matches_exist() {
        let pool = vec![meal("unrelated", &["x"], 5.0), meal("related", &["a"], 1.0)];
        let ranked = rank(pool, &matched(&["a"]), DEFAULT_RANK_LIMIT);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name, "related");
    }

    #[test]
    fn empty_matched_set_keeps_all_meals_at_score_zero() {
        let pool = vec![meal("low", &["x"], 1.0), meal("high", &["y"], 4.0)];
        let ranked = rank(pool, &HashSet::new(), DEFAULT_RANK_LIMIT);
        assert_eq!(ranked.len(), 2);
        // no ingredient signal, rating decides
        assert_eq!(ranked[0].name, "high");
    }

    #[test]
    fn output_is_capped_at_limit() {
        let pool: Vec<Meal> = (0..10).map(|i| meal(&format!("m{i}"), &["a"], 0.0)).collect();
        assert_eq!(rank(pool, &matched(&["a"]), 3).len(), 3);
    }

    #[test]
    fn id_representation_mismatch_still_scores() {
        // the meal stores a miscased, padded reference to the same ingredient
        let pool = vec![meal("sloppy ids", &[" ABC-1 "], 1.0)];
        let ranked = rank(pool, &matched(&["abc-1"]), DEFAULT_RANK_LIMIT);
        assert_eq!(ranked.len(), 1);
        assert_eq!(overlap_score(&ranked[0], &matched(&["abc-1"])), 1);
    }

    #[test]
    fn relaxation_only_when_empty_and_matches_exist() {
        assert!(should_relax_diet_filter(true, true));
        assert!(!should_relax_diet_filter(false, true));
        assert!(!should_relax_diet_filter(true, false));
        assert!(!should_relax_diet_filter(false, false));
    }

    #[test]
    fn bmi_maps_to_diet_type() {
        assert_eq!(diet_type_from_bmi(17.0), Some(DietType::WeightGain));
        assert_eq!(diet_type_from_bmi(22.0), Some(DietType::EatClean));
        assert_eq!(diet_type_from_bmi(27.5), Some(DietType::WeightLoss));
        assert_eq!(diet_type_from_bmi(f64::NAN), None);
        assert_eq!(diet_type_from_bmi(0.0), None);
    }
}
