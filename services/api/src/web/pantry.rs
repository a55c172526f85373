//! services/api/src/web/pantry.rs
//!
//! A person's ingredient stock and its purchase history. Every route acts on
//! the `userId` in the path, which has to be the caller.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use recipe_book_core::validation::ValidationError;
use recipe_book_core::{PantryAddition, PantryItem, PurchaseRecord, QuantityUpdate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::error::{ApiError, ErrorResponse};
use crate::web::auth::MessageResponse;
use crate::web::state::{AppState, CurrentPerson};

//=========================================================================================
// API Payload Structs
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct PantryItemResponse {
    pub ingredient_id: i32,
    pub name: String,
    pub unit_name: Option<String>,
    pub quantity: f64,
    pub purchase_date: NaiveDate,
    pub allergens: Option<String>,
    pub days_to_expire: Option<i32>,
    pub seasonality: Option<String>,
    pub storage_condition: Option<String>,
    /// Absent for ingredients that do not expire.
    pub expires_on: Option<NaiveDate>,
    pub is_expired: bool,
}

impl PantryItemResponse {
    fn new(item: PantryItem, today: NaiveDate) -> Self {
        Self {
            expires_on: item.expires_on(),
            is_expired: item.is_expired(today),
            ingredient_id: item.ingredient_id,
            name: item.ingredient_name,
            unit_name: item.unit_name,
            quantity: item.quantity,
            purchase_date: item.purchase_date,
            allergens: item.allergens,
            days_to_expire: item.days_to_expire,
            seasonality: item.seasonality,
            storage_condition: item.storage_condition,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct PurchaseResponse {
    pub id: i32,
    pub quantity: f64,
    pub purchase_date: NaiveDate,
    pub unit_name: Option<String>,
}

impl From<PurchaseRecord> for PurchaseResponse {
    fn from(p: PurchaseRecord) -> Self {
        Self {
            id: p.id,
            quantity: p.quantity,
            purchase_date: p.purchase_date,
            unit_name: p.unit_name,
        }
    }
}

fn default_quantity() -> f64 {
    1.0
}

#[derive(Deserialize, ToSchema)]
pub struct PantryAdditionItem {
    /// Ingredient id.
    pub id: i32,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct AddPantryRequest {
    pub ingredients: Vec<PantryAdditionItem>,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct QuantityUpdateItem {
    /// Ingredient id.
    pub id: i32,
    /// The new absolute quantity.
    #[serde(alias = "quantity")]
    pub quantity_person_ingradient: f64,
}

/// Either a bare array or `{"updatedIngredients": [...]}`.
#[derive(Deserialize, ToSchema)]
#[serde(untagged)]
pub enum QuantityUpdatesRequest {
    Bare(Vec<QuantityUpdateItem>),
    Wrapped {
        #[serde(rename = "updatedIngredients")]
        updated_ingredients: Vec<QuantityUpdateItem>,
    },
}

/// Reads a quantity update payload, rejecting anything that does not carry an array.
pub fn parse_quantity_updates(body: Value) -> Result<Vec<QuantityUpdate>, ValidationError> {
    let carries_array = match &body {
        Value::Array(_) => true,
        Value::Object(map) => matches!(map.get("updatedIngredients"), Some(Value::Array(_))),
        _ => false,
    };
    if !carries_array {
        return Err(ValidationError::Malformed(
            "expected an array of ingredient quantities".to_string(),
        ));
    }

    let request: QuantityUpdatesRequest =
        serde_json::from_value(body).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    let items = match request {
        QuantityUpdatesRequest::Bare(items) => items,
        QuantityUpdatesRequest::Wrapped {
            updated_ingredients,
        } => updated_ingredients,
    };
    Ok(items
        .into_iter()
        .map(|item| QuantityUpdate {
            ingredient_id: item.id,
            quantity: item.quantity_person_ingradient,
        })
        .collect())
}

//=========================================================================================
// Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/user-ingredients/{userId}",
    tag = "pantry",
    params(("userId" = i32, Path, description = "Pantry owner; must be the caller")),
    responses(
        (status = 200, description = "Pantry entries", body = [PantryItemResponse]),
        (status = 403, description = "Not the caller's pantry", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_pantry_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentPerson>,
    Path(person_id): Path<i32>,
) -> Result<Json<Vec<PantryItemResponse>>, ApiError> {
    caller.ensure_is(person_id)?;
    let today = Utc::now().date_naive();
    let items = state.db.get_pantry(person_id).await?;
    Ok(Json(
        items
            .into_iter()
            .map(|item| PantryItemResponse::new(item, today))
            .collect(),
    ))
}

/// Add ingredients that are not in the pantry yet. Existing entries are left as they are.
#[utoipa::path(
    put,
    path = "/api/user-ingredients/{userId}",
    tag = "pantry",
    params(("userId" = i32, Path, description = "Pantry owner; must be the caller")),
    request_body = AddPantryRequest,
    responses(
        (status = 200, description = "Ingredients added", body = MessageResponse),
        (status = 400, description = "Invalid quantity", body = ErrorResponse),
        (status = 403, description = "Not the caller's pantry", body = ErrorResponse),
        (status = 404, description = "Unknown ingredient", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_pantry_items_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentPerson>,
    Path(person_id): Path<i32>,
    Json(req): Json<AddPantryRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    caller.ensure_is(person_id)?;
    let additions: Vec<PantryAddition> = req
        .ingredients
        .into_iter()
        .map(|item| PantryAddition {
            ingredient_id: item.id,
            quantity: item.quantity,
        })
        .collect();
    state.db.add_pantry_items(person_id, &additions).await?;
    info!("Person {} added {} pantry item(s)", person_id, additions.len());
    Ok(MessageResponse::new("Ingredients added"))
}

/// Set absolute quantities. Quantities can only go up here; increases are recorded as purchases.
#[utoipa::path(
    put,
    path = "/api/user-ingredients/update-quantities/{userId}",
    tag = "pantry",
    params(("userId" = i32, Path, description = "Pantry owner; must be the caller")),
    request_body = QuantityUpdatesRequest,
    responses(
        (status = 200, description = "Quantities updated", body = MessageResponse),
        (status = 400, description = "Not an array, or a quantity decrease", body = ErrorResponse),
        (status = 403, description = "Not the caller's pantry", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_pantry_quantities_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentPerson>,
    Path(person_id): Path<i32>,
    Json(body): Json<Value>,
) -> Result<Json<MessageResponse>, ApiError> {
    caller.ensure_is(person_id)?;
    let updates = parse_quantity_updates(body)?;
    state.db.update_pantry_quantities(person_id, &updates).await?;
    Ok(MessageResponse::new("Quantities updated"))
}

#[utoipa::path(
    delete,
    path = "/api/user-ingredients/{userId}/{ingredientId}",
    tag = "pantry",
    params(
        ("userId" = i32, Path, description = "Pantry owner; must be the caller"),
        ("ingredientId" = i32, Path, description = "Ingredient to remove")
    ),
    responses(
        (status = 200, description = "Ingredient removed", body = MessageResponse),
        (status = 403, description = "Not the caller's pantry", body = ErrorResponse),
        (status = 404, description = "Ingredient not in the pantry", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_pantry_item_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentPerson>,
    Path((person_id, ingredient_id)): Path<(i32, i32)>,
) -> Result<Json<MessageResponse>, ApiError> {
    caller.ensure_is(person_id)?;
    state.db.remove_pantry_item(person_id, ingredient_id).await?;
    Ok(MessageResponse::new(format!(
        "Ingredient {} removed",
        ingredient_id
    )))
}

/// Purchase history of one ingredient, newest first.
#[utoipa::path(
    get,
    path = "/api/user-ingredients/{userId}/history/{ingredientId}",
    tag = "pantry",
    params(
        ("userId" = i32, Path, description = "Pantry owner; must be the caller"),
        ("ingredientId" = i32, Path, description = "Ingredient")
    ),
    responses(
        (status = 200, description = "Purchases", body = [PurchaseResponse]),
        (status = 403, description = "Not the caller's pantry", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn purchase_history_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentPerson>,
    Path((person_id, ingredient_id)): Path<(i32, i32)>,
) -> Result<Json<Vec<PurchaseResponse>>, ApiError> {
    caller.ensure_is(person_id)?;
    let history = state
        .db
        .get_purchase_history(person_id, ingredient_id)
        .await?;
    Ok(Json(history.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_and_wrapped_payloads_are_equivalent() {
        let bare = parse_quantity_updates(json!([{"id": 1, "quantity_person_ingradient": 3}])).unwrap();
        let wrapped = parse_quantity_updates(
            json!({"updatedIngredients": [{"id": 1, "quantity_person_ingradient": 3}]}),
        )
        .unwrap();
        assert_eq!(bare, wrapped);
        assert_eq!(
            bare,
            vec![QuantityUpdate {
                ingredient_id: 1,
                quantity: 3.0
            }]
        );
    }

    #[test]
    fn test_non_array_payload_is_malformed() {
        for body in [
            json!({"id": 1, "quantity_person_ingradient": 3}),
            json!({"updatedIngredients": 4}),
            json!("lots"),
        ] {
            assert!(matches!(
                parse_quantity_updates(body),
                Err(ValidationError::Malformed(_))
            ));
        }
    }

    #[test]
    fn test_addition_quantity_defaults_to_one() {
        let req: AddPantryRequest =
            serde_json::from_value(json!({"ingredients": [{"id": 4}, {"id": 5, "quantity": 2.5}]}))
                .unwrap();
        assert_eq!(req.ingredients[0].quantity, 1.0);
        assert_eq!(req.ingredients[1].quantity, 2.5);
    }
}
