pub mod auth;
pub mod catalog;
pub mod menus;
pub mod middleware;
pub mod pantry;
pub mod recipes;
pub mod rest;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

pub use middleware::require_auth;
pub use state::{AppState, CurrentPerson};

/// Builds every `/api` route. Reads are public; writes and personalized reads
/// go through `require_auth`.
pub fn api_router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/register", post(auth::register_handler))
        .route("/login", post(auth::login_handler))
        .route("/ingredients", get(catalog::list_ingredients_handler))
        .route("/recipe-types", get(catalog::list_recipe_types_handler))
        .route("/recipe-type/{id}", get(catalog::get_recipe_type_handler))
        .route("/recipes", get(recipes::list_recipes_handler))
        .route("/recipes-by-filters", get(recipes::filter_recipes_handler))
        .route("/recipe/{id}", get(recipes::get_recipe_handler))
        .route("/recipes-stats", get(recipes::recipe_stats_handler))
        .route("/menu-categories", get(menus::list_menu_categories_handler))
        .route("/menu", get(menus::list_menus_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/logout", post(auth::logout_handler))
        .route("/recipe-types", post(catalog::create_recipe_type_handler))
        .route("/recipe-type", post(catalog::create_recipe_type_handler))
        .route(
            "/recipe-type/{id}",
            put(catalog::update_recipe_type_handler).delete(catalog::delete_recipe_type_handler),
        )
        .route(
            "/recipes-filters-person/{userId}",
            get(recipes::filter_person_recipes_handler),
        )
        .route("/recipe", post(recipes::create_recipe_handler))
        .route(
            "/recipe/{id}",
            put(recipes::update_recipe_handler).delete(recipes::delete_recipe_handler),
        )
        .route("/create-menu", post(menus::create_menu_handler))
        .route(
            "/menu/{id}",
            get(menus::get_menu_handler)
                .put(menus::update_menu_handler)
                .delete(menus::delete_menu_handler),
        )
        .route(
            "/user-ingredients/update-quantities/{userId}",
            put(pantry::update_pantry_quantities_handler),
        )
        .route(
            "/user-ingredients/{userId}",
            get(pantry::get_pantry_handler).put(pantry::add_pantry_items_handler),
        )
        .route(
            "/user-ingredients/{userId}/{ingredientId}",
            delete(pantry::remove_pantry_item_handler),
        )
        .route(
            "/user-ingredients/{userId}/history/{ingredientId}",
            get(pantry::purchase_history_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new().nest(
        "/api",
        Router::new()
            .merge(public_routes)
            .merge(protected_routes)
            .with_state(state),
    )
}
