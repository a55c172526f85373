//! crates/recipe_book_core/src/validation.rs
//!
//! Client-caused failures and the rules that turn raw input into validated
//! drafts. Nothing here touches storage.

use std::collections::HashSet;

use crate::domain::{IngredientLine, MenuDraft, RecipeDraft, RecipeTypeDraft, RecipeUpdate};

/// A typed client error. The web layer maps every variant to a 400.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("cannot leave a recipe with no ingredients")]
    EmptyIngredientSet,
    #[error("a menu must contain at least one recipe")]
    EmptyRecipeSet,
    #[error("invalid {field}: '{value}'")]
    InvalidDate { field: &'static str, value: String },
    #[error("start_date must not be after end_date")]
    InvertedDateRange,
    #[error("invalid sort_order '{0}', expected 'asc' or 'desc'")]
    InvalidSortOrder(String),
    #[error("invalid type id '{0}'")]
    InvalidTypeId(String),
    #[error("invalid category id '{0}'")]
    InvalidCategoryId(String),
    #[error("cooking_time must not be negative")]
    NegativeCookingTime,
    #[error("quantity for ingredient {0} must be a non-negative number")]
    InvalidQuantity(i32),
    #[error("quantity for ingredient {ingredient_id} cannot decrease from {current} to {requested}")]
    QuantityDecrease {
        ingredient_id: i32,
        current: f64,
        requested: f64,
    },
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Trims a required text field, rejecting it when absent or blank.
pub fn required(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField(field)),
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn validate_quantity(ingredient_id: i32, quantity: f64) -> Result<f64, ValidationError> {
    if quantity.is_finite() && quantity >= 0.0 {
        Ok(quantity)
    } else {
        Err(ValidationError::InvalidQuantity(ingredient_id))
    }
}

fn validate_cooking_time(cooking_time: Option<i32>) -> Result<Option<i32>, ValidationError> {
    match cooking_time {
        Some(minutes) if minutes < 0 => Err(ValidationError::NegativeCookingTime),
        other => Ok(other),
    }
}

/// Checks quantities and collapses repeated ingredient ids, keeping the first line.
pub fn normalize_ingredient_lines(
    lines: Vec<IngredientLine>,
) -> Result<Vec<IngredientLine>, ValidationError> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(lines.len());
    for line in lines {
        validate_quantity(line.ingredient_id, line.quantity)?;
        if seen.insert(line.ingredient_id) {
            normalized.push(line);
        }
    }
    Ok(normalized)
}

/// Decides the ingredient set a recipe ends up with after an update.
///
/// A non-empty list replaces the set. Omitted or empty keeps the existing set,
/// which must itself be non-empty.
pub fn resolve_ingredient_set(
    requested: Option<&[IngredientLine]>,
    existing: Vec<IngredientLine>,
) -> Result<Vec<IngredientLine>, ValidationError> {
    match requested {
        Some(lines) if !lines.is_empty() => Ok(lines.to_vec()),
        _ if existing.is_empty() => Err(ValidationError::EmptyIngredientSet),
        _ => Ok(existing),
    }
}

impl RecipeDraft {
    pub fn new(
        title: Option<String>,
        content: Option<String>,
        person_id: i32,
        type_id: Option<i32>,
        cooking_time: Option<i32>,
        ingredients: Vec<IngredientLine>,
    ) -> Result<Self, ValidationError> {
        let title = required("title", title)?;
        let content = required("content", content)?;
        let cooking_time = validate_cooking_time(cooking_time)?;
        let ingredients = normalize_ingredient_lines(ingredients)?;
        if ingredients.is_empty() {
            return Err(ValidationError::EmptyIngredientSet);
        }
        Ok(Self {
            title,
            content,
            person_id,
            type_id,
            cooking_time,
            ingredients,
        })
    }
}

impl RecipeUpdate {
    pub fn new(
        title: Option<String>,
        content: Option<String>,
        type_id: Option<i32>,
        cooking_time: Option<i32>,
        ingredients: Option<Vec<IngredientLine>>,
    ) -> Result<Self, ValidationError> {
        let title = required("title", title)?;
        let content = required("content", content)?;
        let cooking_time = validate_cooking_time(cooking_time)?;
        // An empty list means "keep what is there", same as omitting it.
        let ingredients = ingredients
            .map(normalize_ingredient_lines)
            .transpose()?
            .filter(|lines| !lines.is_empty());
        Ok(Self {
            title,
            content,
            type_id,
            cooking_time,
            ingredients,
        })
    }
}

impl RecipeTypeDraft {
    pub fn new(
        type_name: Option<String>,
        description: Option<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            type_name: required("type_name", type_name)?,
            description: optional_text(description),
        })
    }
}

impl MenuDraft {
    pub fn new(
        title: Option<String>,
        content: Option<String>,
        category_id: Option<i32>,
        person_id: i32,
        recipe_ids: Vec<i32>,
    ) -> Result<Self, ValidationError> {
        let title = required("menuTitle", title)?;
        let mut seen = HashSet::new();
        let recipe_ids: Vec<i32> = recipe_ids.into_iter().filter(|id| seen.insert(*id)).collect();
        if recipe_ids.is_empty() {
            return Err(ValidationError::EmptyRecipeSet);
        }
        Ok(Self {
            title,
            content: optional_text(content),
            category_id,
            person_id,
            recipe_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(ingredient_id: i32, quantity: f64) -> IngredientLine {
        IngredientLine {
            ingredient_id,
            quantity,
        }
    }

    #[test]
    fn test_required_trims_and_rejects_blank() {
        assert_eq!(required("title", Some("  Soup ".into())), Ok("Soup".to_string()));
        assert_eq!(
            required("title", Some("   ".into())),
            Err(ValidationError::MissingField("title"))
        );
        assert_eq!(required("title", None), Err(ValidationError::MissingField("title")));
    }

    #[test]
    fn test_recipe_draft_requires_ingredients() {
        let err = RecipeDraft::new(
            Some("Soup".into()),
            Some("Boil".into()),
            1,
            None,
            Some(30),
            vec![],
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::EmptyIngredientSet);
    }

    #[test]
    fn test_recipe_draft_rejects_negative_cooking_time() {
        let err = RecipeDraft::new(
            Some("Soup".into()),
            Some("Boil".into()),
            1,
            None,
            Some(-5),
            vec![line(1, 1.0)],
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::NegativeCookingTime);
    }

    #[test]
    fn test_recipe_draft_collapses_duplicate_ingredients() {
        let draft = RecipeDraft::new(
            Some("Soup".into()),
            Some("Boil".into()),
            1,
            Some(2),
            None,
            vec![line(3, 100.0), line(4, 5.0), line(3, 250.0)],
        )
        .unwrap();
        assert_eq!(draft.ingredients, vec![line(3, 100.0), line(4, 5.0)]);
    }

    #[test]
    fn test_negative_or_nan_quantity_is_rejected() {
        assert_eq!(
            normalize_ingredient_lines(vec![line(7, -1.0)]),
            Err(ValidationError::InvalidQuantity(7))
        );
        assert_eq!(
            normalize_ingredient_lines(vec![line(8, f64::NAN)]),
            Err(ValidationError::InvalidQuantity(8))
        );
    }

    #[test]
    fn test_update_with_empty_ingredients_means_keep() {
        let update = RecipeUpdate::new(
            Some("Soup".into()),
            Some("Boil".into()),
            None,
            None,
            Some(vec![]),
        )
        .unwrap();
        assert_eq!(update.ingredients, None);
    }

    #[test]
    fn test_omitted_ingredients_keep_existing_set() {
        let existing = vec![line(1, 200.0), line(2, 3.0)];
        let resolved = resolve_ingredient_set(None, existing.clone()).unwrap();
        assert_eq!(resolved, existing);
    }

    #[test]
    fn test_omitted_ingredients_on_recipe_without_any_is_rejected() {
        assert_eq!(
            resolve_ingredient_set(None, vec![]),
            Err(ValidationError::EmptyIngredientSet)
        );
    }

    #[test]
    fn test_empty_list_keeps_existing_set() {
        assert_eq!(
            resolve_ingredient_set(Some(&[]), vec![line(1, 200.0)]),
            Ok(vec![line(1, 200.0)])
        );
    }

    #[test]
    fn test_empty_list_on_recipe_without_any_is_rejected() {
        assert_eq!(
            resolve_ingredient_set(Some(&[]), vec![]),
            Err(ValidationError::EmptyIngredientSet)
        );
    }

    #[test]
    fn test_new_ingredient_set_replaces_existing() {
        let requested = [line(9, 1.5)];
        let resolved = resolve_ingredient_set(Some(&requested), vec![line(1, 1.0)]).unwrap();
        assert_eq!(resolved, vec![line(9, 1.5)]);
    }

    #[test]
    fn test_menu_draft_needs_title_and_recipes() {
        assert_eq!(
            MenuDraft::new(None, None, None, 1, vec![1]).unwrap_err(),
            ValidationError::MissingField("menuTitle")
        );
        assert_eq!(
            MenuDraft::new(Some("Week".into()), None, None, 1, vec![]).unwrap_err(),
            ValidationError::EmptyRecipeSet
        );
    }

    #[test]
    fn test_menu_draft_dedupes_recipes_in_order() {
        let draft =
            MenuDraft::new(Some("Week".into()), Some(" ".into()), Some(2), 1, vec![3, 1, 3, 2])
                .unwrap();
        assert_eq!(draft.recipe_ids, vec![3, 1, 2]);
        assert_eq!(draft.content, None);
    }

    #[test]
    fn test_recipe_type_draft_requires_name() {
        assert_eq!(
            RecipeTypeDraft::new(Some("".into()), Some("x".into())).unwrap_err(),
            ValidationError::MissingField("type_name")
        );
    }
}
