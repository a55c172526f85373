//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::ErrorResponse;
use crate::web::{auth, catalog, menus, pantry, recipes};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register_handler,
        auth::login_handler,
        auth::logout_handler,
        catalog::list_ingredients_handler,
        catalog::list_recipe_types_handler,
        catalog::get_recipe_type_handler,
        catalog::create_recipe_type_handler,
        catalog::update_recipe_type_handler,
        catalog::delete_recipe_type_handler,
        recipes::list_recipes_handler,
        recipes::filter_recipes_handler,
        recipes::filter_person_recipes_handler,
        recipes::get_recipe_handler,
        recipes::create_recipe_handler,
        recipes::update_recipe_handler,
        recipes::delete_recipe_handler,
        recipes::recipe_stats_handler,
        menus::list_menu_categories_handler,
        menus::list_menus_handler,
        menus::get_menu_handler,
        menus::create_menu_handler,
        menus::update_menu_handler,
        menus::delete_menu_handler,
        pantry::get_pantry_handler,
        pantry::add_pantry_items_handler,
        pantry::update_pantry_quantities_handler,
        pantry::remove_pantry_item_handler,
        pantry::purchase_history_handler,
    ),
    components(
        schemas(
            ErrorResponse,
            auth::MessageResponse,
            recipes::IngredientInput,
            pantry::QuantityUpdateItem,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Registration and bearer tokens."),
        (name = "catalog", description = "Ingredients and recipe types."),
        (name = "recipes", description = "Recipes, filtering and statistics."),
        (name = "menus", description = "Menus and their missing ingredients."),
        (name = "pantry", description = "A person's ingredient stock and purchases.")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
