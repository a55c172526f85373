//! crates/recipe_book_core/src/shopping.rs
//!
//! Works out what a person still has to buy to cook a menu.
//!
//! Every recipe is checked on its own against the same pantry snapshot:
//! a recipe's shortfall for an ingredient is `max(0, required - owned)`, and the
//! menu total for that ingredient is the sum of the per-recipe shortfalls. The
//! pantry is not depleted as recipes are evaluated, so two recipes that each
//! need more flour than is owned both count the owned amount in full.

use std::collections::{BTreeMap, HashMap};

use crate::domain::{MenuRecipe, PantryItem, RecipeIngredient, RecipeSummary};

/// The quantity of one ingredient a single recipe is short of.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingIngredient {
    pub ingredient_id: i32,
    pub ingredient_name: String,
    pub missing_quantity: f64,
    pub unit_name: Option<String>,
}

/// The summed shortfall of one ingredient across a whole menu.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingTotal {
    pub quantity: f64,
    pub unit_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RecipeShortfall {
    pub recipe: RecipeSummary,
    pub missing: Vec<MissingIngredient>,
}

#[derive(Debug, Clone, Default)]
pub struct ShoppingList {
    pub recipes: Vec<RecipeShortfall>,
    /// Keyed by ingredient name. Ingredients nobody is short of are absent.
    pub totals: BTreeMap<String, MissingTotal>,
}

/// Owned quantity per ingredient id.
#[derive(Debug, Clone, Default)]
pub struct PantryStock(HashMap<i32, f64>);

impl PantryStock {
    pub fn owned(&self, ingredient_id: i32) -> f64 {
        self.0.get(&ingredient_id).copied().unwrap_or(0.0)
    }
}

impl From<&[PantryItem]> for PantryStock {
    fn from(items: &[PantryItem]) -> Self {
        Self(
            items
                .iter()
                .map(|item| (item.ingredient_id, item.quantity))
                .collect(),
        )
    }
}

/// Shortfall of one recipe. Lines with nothing missing are left out.
pub fn missing_for_recipe(
    requirements: &[RecipeIngredient],
    pantry: &PantryStock,
) -> Vec<MissingIngredient> {
    requirements
        .iter()
        .filter_map(|req| {
            let missing = (req.quantity - pantry.owned(req.ingredient_id)).max(0.0);
            (missing > 0.0).then(|| MissingIngredient {
                ingredient_id: req.ingredient_id,
                ingredient_name: req.name.clone(),
                missing_quantity: missing,
                unit_name: req.unit_name.clone(),
            })
        })
        .collect()
}

/// Builds the per-recipe and per-menu shortfall. A menu without recipes
/// yields an empty list.
pub fn shopping_list(menu_recipes: Vec<MenuRecipe>, pantry: &[PantryItem]) -> ShoppingList {
    let stock = PantryStock::from(pantry);
    let mut totals: BTreeMap<String, MissingTotal> = BTreeMap::new();

    let recipes = menu_recipes
        .into_iter()
        .map(|menu_recipe| {
            let missing = missing_for_recipe(&menu_recipe.requirements, &stock);
            for item in &missing {
                totals
                    .entry(item.ingredient_name.clone())
                    .and_modify(|total| total.quantity += item.missing_quantity)
                    .or_insert_with(|| MissingTotal {
                        quantity: item.missing_quantity,
                        unit_name: item.unit_name.clone(),
                    });
            }
            RecipeShortfall {
                recipe: menu_recipe.recipe,
                missing,
            }
        })
        .collect();

    ShoppingList { recipes, totals }
}
