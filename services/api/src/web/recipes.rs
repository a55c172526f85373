//! services/api/src/web/recipes.rs
//!
//! Recipe listing, filtering, detail, mutation and statistics endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use recipe_book_core::filter::{RawRecipeFilter, RecipeFilter};
use recipe_book_core::stats::recipe_stats;
use recipe_book_core::{
    IngredientLine, Recipe, RecipeDetail, RecipeDraft, RecipeIngredient, RecipeSummary,
    RecipeUpdate,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, ErrorResponse};
use crate::web::auth::MessageResponse;
use crate::web::state::{AppState, CurrentPerson};

//=========================================================================================
// API Payload Structs
//=========================================================================================

/// A recipe as listed by search endpoints.
#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct RecipeSummaryResponse {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub person_id: Option<i32>,
    pub type_id: Option<i32>,
    pub type_name: Option<String>,
    pub cooking_time: Option<i32>,
    pub creation_date: DateTime<Utc>,
    pub ingredients: Vec<String>,
}

impl From<RecipeSummary> for RecipeSummaryResponse {
    fn from(r: RecipeSummary) -> Self {
        Self {
            id: r.id,
            title: r.title,
            content: r.content,
            person_id: r.person_id,
            type_id: r.type_id,
            type_name: r.type_name,
            cooking_time: r.cooking_time,
            creation_date: r.creation_date,
            ingredients: r.ingredients,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RecipeResponse {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub person_id: Option<i32>,
    pub type_id: Option<i32>,
    pub cooking_time: Option<i32>,
    pub creation_date: DateTime<Utc>,
}

impl From<Recipe> for RecipeResponse {
    fn from(r: Recipe) -> Self {
        Self {
            id: r.id,
            title: r.title,
            content: r.content,
            person_id: r.person_id,
            type_id: r.type_id,
            cooking_time: r.cooking_time,
            creation_date: r.creation_date,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RecipeIngredientResponse {
    pub ingredient_id: i32,
    pub name: String,
    pub quantity: f64,
    pub unit_name: Option<String>,
}

impl From<RecipeIngredient> for RecipeIngredientResponse {
    fn from(i: RecipeIngredient) -> Self {
        Self {
            ingredient_id: i.ingredient_id,
            name: i.name,
            quantity: i.quantity,
            unit_name: i.unit_name,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RecipeDetailResponse {
    #[serde(flatten)]
    pub recipe: RecipeResponse,
    pub type_name: Option<String>,
    pub ingredients: Vec<RecipeIngredientResponse>,
}

impl From<RecipeDetail> for RecipeDetailResponse {
    fn from(d: RecipeDetail) -> Self {
        Self {
            recipe: d.recipe.into(),
            type_name: d.type_name,
            ingredients: d.ingredients.into_iter().map(Into::into).collect(),
        }
    }
}

/// An ingredient of a recipe payload: a bare id, or an id with a quantity.
#[derive(Deserialize, ToSchema, Clone, Copy, Debug)]
#[serde(untagged)]
pub enum IngredientInput {
    Id(i32),
    Line {
        ingredient_id: i32,
        #[serde(default)]
        quantity: f64,
    },
}

impl From<IngredientInput> for IngredientLine {
    fn from(input: IngredientInput) -> Self {
        match input {
            IngredientInput::Id(ingredient_id) => IngredientLine {
                ingredient_id,
                quantity: 0.0,
            },
            IngredientInput::Line {
                ingredient_id,
                quantity,
            } => IngredientLine {
                ingredient_id,
                quantity,
            },
        }
    }
}

#[derive(Deserialize, ToSchema, Default)]
pub struct RecipeRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Defaults to the caller; any other person is rejected.
    pub person_id: Option<i32>,
    pub type_id: Option<i32>,
    pub cooking_time: Option<i32>,
    /// Omitted on update keeps the current ingredients.
    pub ingredients: Option<Vec<IngredientInput>>,
}

fn lines(inputs: Vec<IngredientInput>) -> Vec<IngredientLine> {
    inputs.into_iter().map(Into::into).collect()
}

/// Query parameters accepted by the filter endpoints.
#[derive(Deserialize, IntoParams, Default, Debug)]
#[into_params(parameter_in = Query)]
pub struct RecipeFilterParams {
    /// Case-insensitive substring of any ingredient name.
    pub ingredient_name: Option<String>,
    /// Comma separated recipe type ids.
    pub type_ids: Option<String>,
    /// `YYYY-MM-DD` or RFC 3339, inclusive.
    pub start_date: Option<String>,
    /// `YYYY-MM-DD` or RFC 3339, inclusive.
    pub end_date: Option<String>,
    /// `asc` or `desc`, by cooking time.
    pub sort_order: Option<String>,
}

impl From<RecipeFilterParams> for RawRecipeFilter {
    fn from(p: RecipeFilterParams) -> Self {
        RawRecipeFilter {
            ingredient_name: p.ingredient_name,
            type_ids: p.type_ids,
            start_date: p.start_date,
            end_date: p.end_date,
            sort_order: p.sort_order,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RecipeStatsResponse {
    /// Recipe count per type name. Recipes without a type count as "Untyped".
    pub per_type: BTreeMap<String, usize>,
    pub fastest: Vec<RecipeSummaryResponse>,
    pub slowest: Vec<RecipeSummaryResponse>,
}

//=========================================================================================
// Handlers
//=========================================================================================

async fn search(
    state: &AppState,
    filter: &RecipeFilter,
) -> Result<Json<Vec<RecipeSummaryResponse>>, ApiError> {
    let recipes = state.db.search_recipes(filter).await?;
    Ok(Json(recipes.into_iter().map(Into::into).collect()))
}

/// List every recipe.
#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "recipes",
    responses((status = 200, description = "All recipes", body = [RecipeSummaryResponse]))
)]
pub async fn list_recipes_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RecipeSummaryResponse>>, ApiError> {
    search(&state, &RecipeFilter::default()).await
}

/// Filter recipes. Every criterion is optional; no match is an empty list.
#[utoipa::path(
    get,
    path = "/api/recipes-by-filters",
    tag = "recipes",
    params(RecipeFilterParams),
    responses(
        (status = 200, description = "Matching recipes", body = [RecipeSummaryResponse]),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    )
)]
pub async fn filter_recipes_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecipeFilterParams>,
) -> Result<Json<Vec<RecipeSummaryResponse>>, ApiError> {
    let filter = RecipeFilter::parse(params.into())?;
    search(&state, &filter).await
}

/// Same filters, restricted to the recipes of one person.
#[utoipa::path(
    get,
    path = "/api/recipes-filters-person/{userId}",
    tag = "recipes",
    params(
        ("userId" = i32, Path, description = "Owner of the recipes"),
        RecipeFilterParams
    ),
    responses(
        (status = 200, description = "Matching recipes", body = [RecipeSummaryResponse]),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn filter_person_recipes_handler(
    State(state): State<Arc<AppState>>,
    Path(person_id): Path<i32>,
    Query(params): Query<RecipeFilterParams>,
) -> Result<Json<Vec<RecipeSummaryResponse>>, ApiError> {
    let filter = RecipeFilter::parse(params.into())?.owned_by(person_id);
    search(&state, &filter).await
}

#[utoipa::path(
    get,
    path = "/api/recipe/{id}",
    tag = "recipes",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "The recipe with its ingredients", body = RecipeDetailResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn get_recipe_handler(
    State(state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<Json<RecipeDetailResponse>, ApiError> {
    Ok(Json(state.db.get_recipe(recipe_id).await?.into()))
}

#[utoipa::path(
    post,
    path = "/api/recipe",
    tag = "recipes",
    request_body = RecipeRequest,
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Invalid recipe", body = ErrorResponse),
        (status = 403, description = "person_id is not the caller", body = ErrorResponse),
        (status = 404, description = "Unknown ingredient or type", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_recipe_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentPerson>,
    Json(req): Json<RecipeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(person_id) = req.person_id {
        caller.ensure_is(person_id)?;
    }
    let draft = RecipeDraft::new(
        req.title,
        req.content,
        caller.0,
        req.type_id,
        req.cooking_time,
        lines(req.ingredients.unwrap_or_default()),
    )?;
    let created = state.db.create_recipe(&draft).await?;
    info!("Person {} created recipe {}", caller.0, created.id);
    Ok((StatusCode::CREATED, Json(RecipeResponse::from(created))))
}

#[utoipa::path(
    put,
    path = "/api/recipe/{id}",
    tag = "recipes",
    params(("id" = i32, Path, description = "Recipe ID")),
    request_body = RecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Invalid recipe or empty ingredient set", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_recipe_handler(
    State(state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
    Json(req): Json<RecipeRequest>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let update = RecipeUpdate::new(
        req.title,
        req.content,
        req.type_id,
        req.cooking_time,
        req.ingredients.map(lines),
    )?;
    let updated = state.db.update_recipe(recipe_id, &update).await?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/api/recipe/{id}",
    tag = "recipes",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe deleted", body = MessageResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_recipe_handler(
    State(state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.db.delete_recipe(recipe_id).await?;
    info!("Deleted recipe {}", recipe_id);
    Ok(MessageResponse::new(format!("Recipe {} deleted", recipe_id)))
}

#[utoipa::path(
    get,
    path = "/api/recipes-stats",
    tag = "recipes",
    responses((status = 200, description = "Recipe statistics", body = RecipeStatsResponse))
)]
pub async fn recipe_stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RecipeStatsResponse>, ApiError> {
    let recipes = state.db.search_recipes(&RecipeFilter::default()).await?;
    let stats = recipe_stats(&recipes);
    Ok(Json(RecipeStatsResponse {
        per_type: stats.per_type,
        fastest: stats.fastest.into_iter().map(Into::into).collect(),
        slowest: stats.slowest.into_iter().map(Into::into).collect(),
    }))
}
