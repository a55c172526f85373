//! crates/recipe_book_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Duration, NaiveDate, Utc};

//=========================================================================================
// People and Authentication
//=========================================================================================

/// A registered person. Owns recipes, menus and a pantry.
#[derive(Debug, Clone)]
pub struct Person {
    pub id: i32,
    pub name: String,
    pub surname: String,
    pub login: String,
}

// Only used internally for login/registration - contains sensitive data
#[derive(Debug, Clone)]
pub struct PersonCredentials {
    pub id: i32,
    pub login: String,
    pub hashed_password: String,
}

/// Data required to register a new person.
#[derive(Debug, Clone)]
pub struct NewPerson {
    pub name: String,
    pub surname: String,
    pub login: String,
    pub hashed_password: String,
}

//=========================================================================================
// Ingredients and Recipe Types
//=========================================================================================

#[derive(Debug, Clone)]
pub struct Ingredient {
    pub id: i32,
    pub name: String,
    pub unit_name: Option<String>,
    pub allergens: Option<String>,
    /// `None` means the ingredient does not expire.
    pub days_to_expire: Option<i32>,
    pub seasonality: Option<String>,
    pub storage_condition: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RecipeType {
    pub id: i32,
    pub type_name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RecipeTypeDraft {
    pub type_name: String,
    pub description: Option<String>,
}

//=========================================================================================
// Recipes
//=========================================================================================

/// A recipe row as stored, without its ingredients.
#[derive(Debug, Clone)]
pub struct Recipe {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub person_id: Option<i32>,
    pub type_id: Option<i32>,
    /// Total minutes. Formatting into hours is left to clients.
    pub cooking_time: Option<i32>,
    pub creation_date: DateTime<Utc>,
}

/// A recipe as returned by listing and filtering, with its aggregated
/// ingredient names and resolved type name.
#[derive(Debug, Clone)]
pub struct RecipeSummary {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub person_id: Option<i32>,
    pub type_id: Option<i32>,
    pub type_name: Option<String>,
    pub cooking_time: Option<i32>,
    pub creation_date: DateTime<Utc>,
    /// De-duplicated and sorted alphabetically.
    pub ingredients: Vec<String>,
}

/// One ingredient line of a recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeIngredient {
    pub ingredient_id: i32,
    pub name: String,
    pub quantity: f64,
    pub unit_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RecipeDetail {
    pub recipe: Recipe,
    pub type_name: Option<String>,
    pub ingredients: Vec<RecipeIngredient>,
}

/// An ingredient reference supplied when creating or updating a recipe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IngredientLine {
    pub ingredient_id: i32,
    pub quantity: f64,
}

/// Validated input for creating a recipe.
#[derive(Debug, Clone)]
pub struct RecipeDraft {
    pub title: String,
    pub content: String,
    pub person_id: i32,
    pub type_id: Option<i32>,
    pub cooking_time: Option<i32>,
    pub ingredients: Vec<IngredientLine>,
}

/// Input for updating a recipe. `ingredients: None` keeps the current set.
/// Never `Some` of an empty list.
#[derive(Debug, Clone)]
pub struct RecipeUpdate {
    pub title: String,
    pub content: String,
    pub type_id: Option<i32>,
    pub cooking_time: Option<i32>,
    pub ingredients: Option<Vec<IngredientLine>>,
}

//=========================================================================================
// Menus
//=========================================================================================

#[derive(Debug, Clone)]
pub struct MenuCategory {
    pub id: i32,
    pub category_name: String,
}

#[derive(Debug, Clone)]
pub struct Menu {
    pub id: i32,
    pub title: String,
    pub content: Option<String>,
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
    pub person_id: i32,
}

/// Validated input for creating or replacing a menu.
#[derive(Debug, Clone)]
pub struct MenuDraft {
    pub title: String,
    pub content: Option<String>,
    pub category_id: Option<i32>,
    pub person_id: i32,
    pub recipe_ids: Vec<i32>,
}

/// A recipe of a menu together with what it needs from the pantry.
#[derive(Debug, Clone)]
pub struct MenuRecipe {
    pub recipe: RecipeSummary,
    pub requirements: Vec<RecipeIngredient>,
}

//=========================================================================================
// Pantry
//=========================================================================================

/// A person's recorded stock of one ingredient.
#[derive(Debug, Clone)]
pub struct PantryItem {
    pub ingredient_id: i32,
    pub ingredient_name: String,
    pub unit_name: Option<String>,
    pub quantity: f64,
    pub purchase_date: NaiveDate,
    pub allergens: Option<String>,
    pub days_to_expire: Option<i32>,
    pub seasonality: Option<String>,
    pub storage_condition: Option<String>,
}

impl PantryItem {
    /// The last day the item is good, if the ingredient expires at all.
    /// `None` also when the date would fall outside the calendar range.
    pub fn expires_on(&self) -> Option<NaiveDate> {
        self.days_to_expire.and_then(|days| {
            self.purchase_date
                .checked_add_signed(Duration::days(i64::from(days)))
        })
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expires_on().is_some_and(|last_day| today > last_day)
    }
}

/// A new pantry entry to add.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PantryAddition {
    pub ingredient_id: i32,
    pub quantity: f64,
}

/// A requested absolute quantity for a pantry entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantityUpdate {
    pub ingredient_id: i32,
    pub quantity: f64,
}

#[derive(Debug, Clone)]
pub struct PurchaseRecord {
    pub id: i32,
    pub ingredient_id: i32,
    pub quantity: f64,
    pub purchase_date: NaiveDate,
    pub unit_name: Option<String>,
}
