pub mod domain;
pub mod filter;
pub mod pantry;
pub mod ports;
pub mod shopping;
pub mod stats;
pub mod validation;

pub use domain::{
    Ingredient, IngredientLine, Menu, MenuCategory, MenuDraft, MenuRecipe, NewPerson,
    PantryAddition, PantryItem, Person, PersonCredentials, PurchaseRecord, QuantityUpdate, Recipe,
    RecipeDetail, RecipeDraft, RecipeIngredient, RecipeSummary, RecipeType, RecipeTypeDraft,
    RecipeUpdate,
};
pub use filter::{Predicate, RawRecipeFilter, RecipeFilter, SortKey, SortOrder};
pub use ports::{DatabaseService, PortError, PortResult};
pub use validation::ValidationError;
