//! services/api/src/web/menus.rs
//!
//! Menu endpoints, including the per-menu shopping list for the caller.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use recipe_book_core::shopping::{shopping_list, MissingIngredient, ShoppingList};
use recipe_book_core::validation::ValidationError;
use recipe_book_core::{Menu, MenuCategory, MenuDraft};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, ErrorResponse};
use crate::web::auth::MessageResponse;
use crate::web::recipes::RecipeSummaryResponse;
use crate::web::state::{AppState, CurrentPerson};

//=========================================================================================
// API Payload Structs
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema)]
pub struct MenuCategoryResponse {
    pub id: i32,
    pub category_name: String,
}

impl From<MenuCategory> for MenuCategoryResponse {
    fn from(c: MenuCategory) -> Self {
        Self {
            id: c.id,
            category_name: c.category_name,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct MenuResponse {
    pub id: i32,
    pub title: String,
    pub content: Option<String>,
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
    pub person_id: i32,
}

impl From<Menu> for MenuResponse {
    fn from(m: Menu) -> Self {
        Self {
            id: m.id,
            title: m.title,
            content: m.content,
            category_id: m.category_id,
            category_name: m.category_name,
            person_id: m.person_id,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, PartialEq)]
pub struct MissingIngredientResponse {
    pub ingredient_id: i32,
    pub ingredient_name: String,
    pub missing_quantity: f64,
    pub unit_name: Option<String>,
}

impl From<MissingIngredient> for MissingIngredientResponse {
    fn from(m: MissingIngredient) -> Self {
        Self {
            ingredient_id: m.ingredient_id,
            ingredient_name: m.ingredient_name,
            missing_quantity: m.missing_quantity,
            unit_name: m.unit_name,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct MenuRecipeResponse {
    #[serde(flatten)]
    pub recipe: RecipeSummaryResponse,
    #[serde(rename = "missingIngredients")]
    pub missing_ingredients: Vec<MissingIngredientResponse>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, PartialEq)]
pub struct MissingTotalResponse {
    pub quantity: f64,
    pub unit: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct MenuDetailResponse {
    pub menu: MenuResponse,
    pub recipes: Vec<MenuRecipeResponse>,
    /// Shortfall per ingredient name over the whole menu.
    #[serde(rename = "missingIngredients")]
    pub missing_ingredients: BTreeMap<String, MissingTotalResponse>,
}

impl MenuDetailResponse {
    fn new(menu: Menu, list: ShoppingList) -> Self {
        Self {
            menu: menu.into(),
            recipes: list
                .recipes
                .into_iter()
                .map(|r| MenuRecipeResponse {
                    recipe: r.recipe.into(),
                    missing_ingredients: r.missing.into_iter().map(Into::into).collect(),
                })
                .collect(),
            missing_ingredients: list
                .totals
                .into_iter()
                .map(|(name, total)| {
                    (
                        name,
                        MissingTotalResponse {
                            quantity: total.quantity,
                            unit: total.unit_name,
                        },
                    )
                })
                .collect(),
        }
    }
}

/// Body of `POST /api/create-menu` and `PUT /api/menu/{id}`.
#[derive(Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct MenuRequest {
    pub menu_title: Option<String>,
    pub menu_content: Option<String>,
    pub category_id: Option<i32>,
    /// Defaults to the caller; any other person is rejected.
    pub person_id: Option<i32>,
    #[serde(default)]
    pub recipe_ids: Vec<i32>,
}

impl MenuRequest {
    fn into_draft(self, caller: CurrentPerson) -> Result<MenuDraft, ApiError> {
        if let Some(person_id) = self.person_id {
            caller.ensure_is(person_id)?;
        }
        Ok(MenuDraft::new(
            self.menu_title,
            self.menu_content,
            self.category_id,
            caller.0,
            self.recipe_ids,
        )?)
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMenuResponse {
    pub menu_id: i32,
}

#[derive(Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct MenuListParams {
    /// Only menus of this category.
    pub category_id: Option<String>,
}

fn parse_category_id(raw: Option<String>) -> Result<Option<i32>, ValidationError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<i32>()
            .map(Some)
            .map_err(|_| ValidationError::InvalidCategoryId(value.to_string())),
    }
}

/// Loads a menu and checks that the caller owns it.
async fn owned_menu(state: &AppState, menu_id: i32, caller: CurrentPerson) -> Result<Menu, ApiError> {
    let menu = state.db.get_menu(menu_id).await?;
    caller.ensure_is(menu.person_id)?;
    Ok(menu)
}

//=========================================================================================
// Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/menu-categories",
    tag = "menus",
    responses((status = 200, description = "All menu categories", body = [MenuCategoryResponse]))
)]
pub async fn list_menu_categories_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MenuCategoryResponse>>, ApiError> {
    let categories = state.db.list_menu_categories().await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// List menus, optionally of one category. No match is an empty list.
#[utoipa::path(
    get,
    path = "/api/menu",
    tag = "menus",
    params(MenuListParams),
    responses(
        (status = 200, description = "Menus", body = [MenuResponse]),
        (status = 400, description = "category_id is not an integer", body = ErrorResponse)
    )
)]
pub async fn list_menus_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MenuListParams>,
) -> Result<Json<Vec<MenuResponse>>, ApiError> {
    let category_id = parse_category_id(params.category_id)?;
    let menus = state.db.list_menus(category_id).await?;
    Ok(Json(menus.into_iter().map(Into::into).collect()))
}

/// A menu with its recipes and what the caller still has to buy for them.
#[utoipa::path(
    get,
    path = "/api/menu/{id}",
    tag = "menus",
    params(("id" = i32, Path, description = "Menu ID")),
    responses(
        (status = 200, description = "Menu with missing ingredients", body = MenuDetailResponse),
        (status = 404, description = "Menu not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_menu_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentPerson>,
    Path(menu_id): Path<i32>,
) -> Result<Json<MenuDetailResponse>, ApiError> {
    let menu = state.db.get_menu(menu_id).await?;
    let menu_recipes = state.db.get_menu_recipes(menu_id).await?;
    let pantry = state.db.get_pantry(caller.0).await?;
    let list = shopping_list(menu_recipes, &pantry);
    Ok(Json(MenuDetailResponse::new(menu, list)))
}

#[utoipa::path(
    post,
    path = "/api/create-menu",
    tag = "menus",
    request_body = MenuRequest,
    responses(
        (status = 201, description = "Menu created", body = CreateMenuResponse),
        (status = 400, description = "Missing title or recipes", body = ErrorResponse),
        (status = 403, description = "personId is not the caller", body = ErrorResponse),
        (status = 404, description = "Unknown recipe or category", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_menu_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentPerson>,
    Json(req): Json<MenuRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = req.into_draft(caller)?;
    let menu_id = state.db.create_menu(&draft).await?;
    info!("Person {} created menu {}", caller.0, menu_id);
    Ok((StatusCode::CREATED, Json(CreateMenuResponse { menu_id })))
}

#[utoipa::path(
    put,
    path = "/api/menu/{id}",
    tag = "menus",
    params(("id" = i32, Path, description = "Menu ID")),
    request_body = MenuRequest,
    responses(
        (status = 200, description = "Menu updated", body = MessageResponse),
        (status = 400, description = "Missing title or recipes", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Menu not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_menu_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentPerson>,
    Path(menu_id): Path<i32>,
    Json(req): Json<MenuRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    owned_menu(&state, menu_id, caller).await?;
    let draft = req.into_draft(caller)?;
    state.db.update_menu(menu_id, &draft).await?;
    Ok(MessageResponse::new(format!("Menu {} updated", menu_id)))
}

#[utoipa::path(
    delete,
    path = "/api/menu/{id}",
    tag = "menus",
    params(("id" = i32, Path, description = "Menu ID")),
    responses(
        (status = 200, description = "Menu deleted", body = MessageResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Menu not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_menu_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentPerson>,
    Path(menu_id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    owned_menu(&state, menu_id, caller).await?;
    state.db.delete_menu(menu_id).await?;
    info!("Person {} deleted menu {}", caller.0, menu_id);
    Ok(MessageResponse::new(format!("Menu {} deleted", menu_id)))
}
