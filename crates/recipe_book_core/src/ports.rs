//! crates/recipe_book_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete database implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Ingredient, Menu, MenuCategory, MenuDraft, MenuRecipe, NewPerson, PantryAddition, PantryItem,
    Person, PersonCredentials, PurchaseRecord, QuantityUpdate, Recipe, RecipeDetail, RecipeDraft,
    RecipeSummary, RecipeType, RecipeTypeDraft, RecipeUpdate,
};
use crate::filter::RecipeFilter;
use crate::validation::ValidationError;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., the database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Person & Auth Management ---
    async fn create_person(&self, person: &NewPerson) -> PortResult<Person>;

    async fn get_person_credentials(&self, login: &str) -> PortResult<PersonCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        person_id: i32,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Resolves a live (unexpired) auth session into its person id.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<i32>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Ingredients ---
    async fn list_ingredients(&self) -> PortResult<Vec<Ingredient>>;

    // --- Recipe Types ---
    async fn list_recipe_types(&self) -> PortResult<Vec<RecipeType>>;

    async fn get_recipe_type(&self, type_id: i32) -> PortResult<RecipeType>;

    async fn create_recipe_type(&self, draft: &RecipeTypeDraft) -> PortResult<RecipeType>;

    async fn update_recipe_type(
        &self,
        type_id: i32,
        draft: &RecipeTypeDraft,
    ) -> PortResult<RecipeType>;

    /// Fails with `Conflict` while any recipe still references the type.
    async fn delete_recipe_type(&self, type_id: i32) -> PortResult<()>;

    // --- Recipes ---
    async fn search_recipes(&self, filter: &RecipeFilter) -> PortResult<Vec<RecipeSummary>>;

    async fn get_recipe(&self, recipe_id: i32) -> PortResult<RecipeDetail>;

    /// Inserts the recipe and its ingredient rows atomically.
    async fn create_recipe(&self, draft: &RecipeDraft) -> PortResult<Recipe>;

    /// Updates the recipe and replaces its ingredient rows atomically.
    async fn update_recipe(&self, recipe_id: i32, update: &RecipeUpdate) -> PortResult<Recipe>;

    /// Removes every join row referencing the recipe, then the recipe itself.
    async fn delete_recipe(&self, recipe_id: i32) -> PortResult<()>;

    // --- Menus ---
    async fn list_menu_categories(&self) -> PortResult<Vec<MenuCategory>>;

    async fn list_menus(&self, category_id: Option<i32>) -> PortResult<Vec<Menu>>;

    async fn get_menu(&self, menu_id: i32) -> PortResult<Menu>;

    async fn get_menu_recipes(&self, menu_id: i32) -> PortResult<Vec<MenuRecipe>>;

    async fn create_menu(&self, draft: &MenuDraft) -> PortResult<i32>;

    async fn update_menu(&self, menu_id: i32, draft: &MenuDraft) -> PortResult<()>;

    async fn delete_menu(&self, menu_id: i32) -> PortResult<()>;

    // --- Pantry ---
    async fn get_pantry(&self, person_id: i32) -> PortResult<Vec<PantryItem>>;

    /// Adds entries that are not yet in the pantry. Existing entries are untouched.
    async fn add_pantry_items(
        &self,
        person_id: i32,
        additions: &[PantryAddition],
    ) -> PortResult<()>;

    async fn update_pantry_quantities(
        &self,
        person_id: i32,
        updates: &[QuantityUpdate],
    ) -> PortResult<()>;

    async fn remove_pantry_item(&self, person_id: i32, ingredient_id: i32) -> PortResult<()>;

    async fn get_purchase_history(
        &self,
        person_id: i32,
        ingredient_id: i32,
    ) -> PortResult<Vec<PurchaseRecord>>;
}
