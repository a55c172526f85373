//! crates/recipe_book_core/src/stats.rs
//!
//! Summary figures over a list of recipes.

use std::collections::BTreeMap;

use crate::domain::RecipeSummary;

/// Label used for recipes that have no type.
pub const UNTYPED: &str = "Untyped";

#[derive(Debug, Clone, Default)]
pub struct RecipeStats {
    /// Recipe count per type name, ordered by name.
    pub per_type: BTreeMap<String, usize>,
    /// Every recipe sharing the shortest cooking time.
    pub fastest: Vec<RecipeSummary>,
    /// Every recipe sharing the longest cooking time.
    pub slowest: Vec<RecipeSummary>,
}

pub fn recipe_stats(recipes: &[RecipeSummary]) -> RecipeStats {
    let mut per_type = BTreeMap::new();
    for recipe in recipes {
        let name = recipe.type_name.as_deref().unwrap_or(UNTYPED);
        *per_type.entry(name.to_string()).or_insert(0) += 1;
    }

    let timed = || recipes.iter().filter_map(|r| r.cooking_time.map(|t| (t, r)));
    let with_time = |target: Option<i32>| -> Vec<RecipeSummary> {
        match target {
            Some(t) => timed()
                .filter(|(time, _)| *time == t)
                .map(|(_, r)| r.clone())
                .collect(),
            None => Vec::new(),
        }
    };

    RecipeStats {
        per_type,
        fastest: with_time(timed().map(|(t, _)| t).min()),
        slowest: with_time(timed().map(|(t, _)| t).max()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn recipe(id: i32, type_name: Option<&str>, cooking_time: Option<i32>) -> RecipeSummary {
        RecipeSummary {
            id,
            title: format!("Recipe {id}"),
            content: String::new(),
            person_id: None,
            type_id: None,
            type_name: type_name.map(String::from),
            cooking_time,
            creation_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            ingredients: vec![],
        }
    }

    #[test]
    fn test_counts_per_type_and_extremes_with_ties() {
        let recipes = vec![
            recipe(1, Some("Soup"), Some(30)),
            recipe(2, Some("Soup"), Some(10)),
            recipe(3, Some("Dessert"), Some(90)),
            recipe(4, None, Some(10)),
            recipe(5, Some("Dessert"), None),
        ];
        let stats = recipe_stats(&recipes);

        assert_eq!(stats.per_type["Soup"], 2);
        assert_eq!(stats.per_type["Dessert"], 2);
        assert_eq!(stats.per_type[UNTYPED], 1);

        let fastest: Vec<i32> = stats.fastest.iter().map(|r| r.id).collect();
        let slowest: Vec<i32> = stats.slowest.iter().map(|r| r.id).collect();
        assert_eq!(fastest, vec![2, 4]);
        assert_eq!(slowest, vec![3]);
    }

    #[test]
    fn test_no_timed_recipes() {
        let stats = recipe_stats(&[recipe(1, None, None)]);
        assert!(stats.fastest.is_empty());
        assert!(stats.slowest.is_empty());
        assert_eq!(stats.per_type.len(), 1);
    }
}
