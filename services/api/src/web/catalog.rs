//! services/api/src/web/catalog.rs
//!
//! Reference data: the ingredient catalogue and recipe types.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use recipe_book_core::{Ingredient, RecipeType, RecipeTypeDraft};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::error::{ApiError, ErrorResponse};
use crate::web::auth::MessageResponse;
use crate::web::state::AppState;

//=========================================================================================
// API Payload Structs
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema)]
pub struct IngredientResponse {
    pub id: i32,
    pub name: String,
    pub unit_name: Option<String>,
    pub allergens: Option<String>,
    pub days_to_expire: Option<i32>,
    pub seasonality: Option<String>,
    pub storage_condition: Option<String>,
}

impl From<Ingredient> for IngredientResponse {
    fn from(i: Ingredient) -> Self {
        Self {
            id: i.id,
            name: i.name,
            unit_name: i.unit_name,
            allergens: i.allergens,
            days_to_expire: i.days_to_expire,
            seasonality: i.seasonality,
            storage_condition: i.storage_condition,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RecipeTypeResponse {
    pub id: i32,
    pub type_name: String,
    pub description: Option<String>,
}

impl From<RecipeType> for RecipeTypeResponse {
    fn from(t: RecipeType) -> Self {
        Self {
            id: t.id,
            type_name: t.type_name,
            description: t.description,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct RecipeTypeRequest {
    pub type_name: Option<String>,
    pub description: Option<String>,
}

impl TryFrom<RecipeTypeRequest> for RecipeTypeDraft {
    type Error = ApiError;

    fn try_from(req: RecipeTypeRequest) -> Result<Self, Self::Error> {
        Ok(RecipeTypeDraft::new(req.type_name, req.description)?)
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// List every ingredient, ordered by name.
#[utoipa::path(
    get,
    path = "/api/ingredients",
    tag = "catalog",
    responses((status = 200, description = "All ingredients", body = [IngredientResponse]))
)]
pub async fn list_ingredients_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<IngredientResponse>>, ApiError> {
    let ingredients = state.db.list_ingredients().await?;
    Ok(Json(ingredients.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/recipe-types",
    tag = "catalog",
    responses((status = 200, description = "All recipe types", body = [RecipeTypeResponse]))
)]
pub async fn list_recipe_types_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RecipeTypeResponse>>, ApiError> {
    let types = state.db.list_recipe_types().await?;
    Ok(Json(types.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/recipe-type/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Recipe type ID")),
    responses(
        (status = 200, description = "The recipe type", body = RecipeTypeResponse),
        (status = 404, description = "Recipe type not found", body = ErrorResponse)
    )
)]
pub async fn get_recipe_type_handler(
    State(state): State<Arc<AppState>>,
    Path(type_id): Path<i32>,
) -> Result<Json<RecipeTypeResponse>, ApiError> {
    Ok(Json(state.db.get_recipe_type(type_id).await?.into()))
}

#[utoipa::path(
    post,
    path = "/api/recipe-types",
    tag = "catalog",
    request_body = RecipeTypeRequest,
    responses(
        (status = 201, description = "Recipe type created", body = RecipeTypeResponse),
        (status = 400, description = "type_name missing", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_recipe_type_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RecipeTypeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = RecipeTypeDraft::try_from(req)?;
    let created = state.db.create_recipe_type(&draft).await?;
    info!("Created recipe type {}", created.id);
    Ok((StatusCode::CREATED, Json(RecipeTypeResponse::from(created))))
}

#[utoipa::path(
    put,
    path = "/api/recipe-type/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Recipe type ID")),
    request_body = RecipeTypeRequest,
    responses(
        (status = 200, description = "Recipe type updated", body = RecipeTypeResponse),
        (status = 404, description = "Recipe type not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_recipe_type_handler(
    State(state): State<Arc<AppState>>,
    Path(type_id): Path<i32>,
    Json(req): Json<RecipeTypeRequest>,
) -> Result<Json<RecipeTypeResponse>, ApiError> {
    let draft = RecipeTypeDraft::try_from(req)?;
    Ok(Json(state.db.update_recipe_type(type_id, &draft).await?.into()))
}

/// Refused with 409 while recipes still use the type.
#[utoipa::path(
    delete,
    path = "/api/recipe-type/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Recipe type ID")),
    responses(
        (status = 200, description = "Recipe type deleted", body = MessageResponse),
        (status = 404, description = "Recipe type not found", body = ErrorResponse),
        (status = 409, description = "Recipe type still in use", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_recipe_type_handler(
    State(state): State<Arc<AppState>>,
    Path(type_id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.db.delete_recipe_type(type_id).await?;
    info!("Deleted recipe type {}", type_id);
    Ok(MessageResponse::new(format!("Recipe type {} deleted", type_id)))
}
