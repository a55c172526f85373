//! Handler tests against an in-memory `DatabaseService`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use api_lib::config::Config;
use api_lib::web::{menus, pantry, recipes, AppState, CurrentPerson};
use async_trait::async_trait;
use axum::{
    body::to_bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use recipe_book_core::filter::RecipeFilter;
use recipe_book_core::pantry::{plan_additions, plan_quantity_updates, PantryChange};
use recipe_book_core::ports::{DatabaseService, PortError, PortResult};
use recipe_book_core::validation::resolve_ingredient_set;
use recipe_book_core::*;
use serde_json::{json, Value};

//=========================================================================================
// In-memory fake
//=========================================================================================

#[derive(Default)]
struct Store {
    recipes: Vec<RecipeSummary>,
    lines: HashMap<i32, Vec<IngredientLine>>,
    ingredients: HashMap<i32, (String, String)>,
    menus: Vec<Menu>,
    menu_recipes: HashMap<i32, Vec<i32>>,
    pantry: HashMap<i32, HashMap<i32, f64>>,
    history: Vec<(i32, PurchaseRecord)>,
}

#[derive(Default)]
struct FakeDb {
    store: Mutex<Store>,
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, d, 12, 0, 0).unwrap()
}

impl FakeDb {
    /// Flour (g), Carrot (pcs), Salt (g); two recipes owned by person 1.
    fn seeded() -> Self {
        let db = FakeDb::default();
        {
            let mut s = db.store.lock().unwrap();
            s.ingredients.insert(1, ("Flour".into(), "g".into()));
            s.ingredients.insert(2, ("Carrot".into(), "pcs".into()));
            s.ingredients.insert(3, ("Salt".into(), "g".into()));
            s.recipes.push(summary(10, "Bread", Some(1), Some(60), day(1)));
            s.recipes.push(summary(11, "Soup", Some(1), Some(30), day(2)));
            s.lines.insert(10, vec![line(1, 200.0), line(3, 5.0)]);
            s.lines.insert(11, vec![line(1, 150.0), line(2, 2.0), line(3, 5.0)]);
            s.menus.push(Menu {
                id: 50,
                title: "Week".into(),
                content: None,
                category_id: Some(1),
                category_name: Some("Dinner".into()),
                person_id: 1,
            });
            s.menu_recipes.insert(50, vec![10, 11]);
            s.pantry
                .insert(1, HashMap::from([(1, 100.0), (3, 50.0)]));
        }
        db
    }

    fn names(&self, s: &Store, recipe_id: i32) -> Vec<String> {
        let mut names: Vec<String> = s
            .lines
            .get(&recipe_id)
            .into_iter()
            .flatten()
            .map(|l| s.ingredients[&l.ingredient_id].0.clone())
            .collect();
        names.sort();
        names
    }

    fn requirements(s: &Store, recipe_id: i32) -> Vec<RecipeIngredient> {
        s.lines
            .get(&recipe_id)
            .into_iter()
            .flatten()
            .map(|l| {
                let (name, unit) = &s.ingredients[&l.ingredient_id];
                RecipeIngredient {
                    ingredient_id: l.ingredient_id,
                    name: name.clone(),
                    quantity: l.quantity,
                    unit_name: Some(unit.clone()),
                }
            })
            .collect()
    }
}

fn summary(
    id: i32,
    title: &str,
    person_id: Option<i32>,
    cooking_time: Option<i32>,
    created: DateTime<Utc>,
) -> RecipeSummary {
    RecipeSummary {
        id,
        title: title.into(),
        content: format!("How to make {title}"),
        person_id,
        type_id: None,
        type_name: None,
        cooking_time,
        creation_date: created,
        ingredients: Vec::new(),
    }
}

fn line(ingredient_id: i32, quantity: f64) -> IngredientLine {
    IngredientLine {
        ingredient_id,
        quantity,
    }
}

fn missing(what: &str, id: i32) -> PortError {
    PortError::NotFound(format!("{what} {id} not found"))
}

#[async_trait]
impl DatabaseService for FakeDb {
    async fn create_person(&self, _person: &NewPerson) -> PortResult<Person> {
        Err(PortError::Unexpected("not used".into()))
    }
    async fn get_person_credentials(&self, login: &str) -> PortResult<PersonCredentials> {
        Err(PortError::NotFound(format!("Person {login} not found")))
    }
    async fn create_auth_session(
        &self,
        _session_id: &str,
        _person_id: i32,
        _expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        Ok(())
    }
    async fn validate_auth_session(&self, _session_id: &str) -> PortResult<i32> {
        Err(PortError::Unauthorized)
    }
    async fn delete_auth_session(&self, _session_id: &str) -> PortResult<()> {
        Ok(())
    }
    async fn list_ingredients(&self) -> PortResult<Vec<Ingredient>> {
        Ok(Vec::new())
    }
    async fn list_recipe_types(&self) -> PortResult<Vec<RecipeType>> {
        Ok(Vec::new())
    }
    async fn get_recipe_type(&self, type_id: i32) -> PortResult<RecipeType> {
        Err(missing("Recipe type", type_id))
    }
    async fn create_recipe_type(&self, draft: &RecipeTypeDraft) -> PortResult<RecipeType> {
        Ok(RecipeType {
            id: 1,
            type_name: draft.type_name.clone(),
            description: draft.description.clone(),
        })
    }
    async fn update_recipe_type(
        &self,
        type_id: i32,
        _draft: &RecipeTypeDraft,
    ) -> PortResult<RecipeType> {
        Err(missing("Recipe type", type_id))
    }
    async fn delete_recipe_type(&self, type_id: i32) -> PortResult<()> {
        Err(missing("Recipe type", type_id))
    }

    async fn search_recipes(&self, filter: &RecipeFilter) -> PortResult<Vec<RecipeSummary>> {
        let s = self.store.lock().unwrap();
        let all = s
            .recipes
            .iter()
            .cloned()
            .map(|mut r| {
                r.ingredients = self.names(&s, r.id);
                r
            })
            .collect();
        Ok(filter.apply(all))
    }

    async fn get_recipe(&self, recipe_id: i32) -> PortResult<RecipeDetail> {
        let s = self.store.lock().unwrap();
        let r = s
            .recipes
            .iter()
            .find(|r| r.id == recipe_id)
            .ok_or_else(|| missing("Recipe", recipe_id))?;
        Ok(RecipeDetail {
            recipe: Recipe {
                id: r.id,
                title: r.title.clone(),
                content: r.content.clone(),
                person_id: r.person_id,
                type_id: r.type_id,
                cooking_time: r.cooking_time,
                creation_date: r.creation_date,
            },
            type_name: r.type_name.clone(),
            ingredients: FakeDb::requirements(&s, recipe_id),
        })
    }

    async fn create_recipe(&self, draft: &RecipeDraft) -> PortResult<Recipe> {
        let mut s = self.store.lock().unwrap();
        if let Some(unknown) = draft
            .ingredients
            .iter()
            .find(|l| !s.ingredients.contains_key(&l.ingredient_id))
        {
            return Err(missing("Ingredient", unknown.ingredient_id));
        }
        let id = s.recipes.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let mut r = summary(id, &draft.title, Some(draft.person_id), draft.cooking_time, day(3));
        r.content = draft.content.clone();
        s.recipes.push(r);
        s.lines.insert(id, draft.ingredients.clone());
        Ok(Recipe {
            id,
            title: draft.title.clone(),
            content: draft.content.clone(),
            person_id: Some(draft.person_id),
            type_id: draft.type_id,
            cooking_time: draft.cooking_time,
            creation_date: day(3),
        })
    }

    async fn update_recipe(&self, recipe_id: i32, update: &RecipeUpdate) -> PortResult<Recipe> {
        let mut s = self.store.lock().unwrap();
        let existing = s.lines.get(&recipe_id).cloned().unwrap_or_default();
        let r = s
            .recipes
            .iter_mut()
            .find(|r| r.id == recipe_id)
            .ok_or_else(|| missing("Recipe", recipe_id))?;
        r.title = update.title.clone();
        r.content = update.content.clone();
        r.cooking_time = update.cooking_time;
        let updated = Recipe {
            id: r.id,
            title: r.title.clone(),
            content: r.content.clone(),
            person_id: r.person_id,
            type_id: update.type_id,
            cooking_time: r.cooking_time,
            creation_date: r.creation_date,
        };
        let lines = resolve_ingredient_set(update.ingredients.as_deref(), existing)?;
        s.lines.insert(recipe_id, lines);
        Ok(updated)
    }

    async fn delete_recipe(&self, recipe_id: i32) -> PortResult<()> {
        let mut s = self.store.lock().unwrap();
        let before = s.recipes.len();
        s.recipes.retain(|r| r.id != recipe_id);
        if s.recipes.len() == before {
            return Err(missing("Recipe", recipe_id));
        }
        s.lines.remove(&recipe_id);
        for ids in s.menu_recipes.values_mut() {
            ids.retain(|id| *id != recipe_id);
        }
        Ok(())
    }

    async fn list_menu_categories(&self) -> PortResult<Vec<MenuCategory>> {
        Ok(vec![MenuCategory {
            id: 1,
            category_name: "Dinner".into(),
        }])
    }

    async fn list_menus(&self, category_id: Option<i32>) -> PortResult<Vec<Menu>> {
        let s = self.store.lock().unwrap();
        Ok(s.menus
            .iter()
            .filter(|m| category_id.is_none() || m.category_id == category_id)
            .cloned()
            .collect())
    }

    async fn get_menu(&self, menu_id: i32) -> PortResult<Menu> {
        let s = self.store.lock().unwrap();
        s.menus
            .iter()
            .find(|m| m.id == menu_id)
            .cloned()
            .ok_or_else(|| missing("Menu", menu_id))
    }

    async fn get_menu_recipes(&self, menu_id: i32) -> PortResult<Vec<MenuRecipe>> {
        let s = self.store.lock().unwrap();
        let ids = s.menu_recipes.get(&menu_id).cloned().unwrap_or_default();
        Ok(ids
            .into_iter()
            .filter_map(|id| s.recipes.iter().find(|r| r.id == id).cloned())
            .map(|mut recipe| {
                recipe.ingredients = self.names(&s, recipe.id);
                MenuRecipe {
                    requirements: FakeDb::requirements(&s, recipe.id),
                    recipe,
                }
            })
            .collect())
    }

    async fn create_menu(&self, draft: &MenuDraft) -> PortResult<i32> {
        let mut s = self.store.lock().unwrap();
        let id = s.menus.iter().map(|m| m.id).max().unwrap_or(0) + 1;
        s.menus.push(Menu {
            id,
            title: draft.title.clone(),
            content: draft.content.clone(),
            category_id: draft.category_id,
            category_name: None,
            person_id: draft.person_id,
        });
        s.menu_recipes.insert(id, draft.recipe_ids.clone());
        Ok(id)
    }

    async fn update_menu(&self, menu_id: i32, draft: &MenuDraft) -> PortResult<()> {
        let mut s = self.store.lock().unwrap();
        let menu = s
            .menus
            .iter_mut()
            .find(|m| m.id == menu_id)
            .ok_or_else(|| missing("Menu", menu_id))?;
        menu.title = draft.title.clone();
        s.menu_recipes.insert(menu_id, draft.recipe_ids.clone());
        Ok(())
    }

    async fn delete_menu(&self, menu_id: i32) -> PortResult<()> {
        let mut s = self.store.lock().unwrap();
        let before = s.menus.len();
        s.menus.retain(|m| m.id != menu_id);
        if s.menus.len() == before {
            return Err(missing("Menu", menu_id));
        }
        s.menu_recipes.remove(&menu_id);
        Ok(())
    }

    async fn get_pantry(&self, person_id: i32) -> PortResult<Vec<PantryItem>> {
        let s = self.store.lock().unwrap();
        let mut items: Vec<PantryItem> = s
            .pantry
            .get(&person_id)
            .into_iter()
            .flatten()
            .map(|(id, quantity)| {
                let (name, unit) = &s.ingredients[id];
                PantryItem {
                    ingredient_id: *id,
                    ingredient_name: name.clone(),
                    unit_name: Some(unit.clone()),
                    quantity: *quantity,
                    purchase_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                    allergens: None,
                    days_to_expire: (*id == 2).then_some(3),
                    seasonality: None,
                    storage_condition: None,
                }
            })
            .collect();
        items.sort_by(|a, b| a.ingredient_name.cmp(&b.ingredient_name));
        Ok(items)
    }

    async fn add_pantry_items(
        &self,
        person_id: i32,
        additions: &[PantryAddition],
    ) -> PortResult<()> {
        let mut s = self.store.lock().unwrap();
        let current = s.pantry.get(&person_id).cloned().unwrap_or_default();
        let changes = plan_additions(&current, additions)?;
        apply(&mut s, person_id, &changes);
        Ok(())
    }

    async fn update_pantry_quantities(
        &self,
        person_id: i32,
        updates: &[QuantityUpdate],
    ) -> PortResult<()> {
        let mut s = self.store.lock().unwrap();
        let current = s.pantry.get(&person_id).cloned().unwrap_or_default();
        let changes = plan_quantity_updates(&current, updates)?;
        apply(&mut s, person_id, &changes);
        Ok(())
    }

    async fn remove_pantry_item(&self, person_id: i32, ingredient_id: i32) -> PortResult<()> {
        let mut s = self.store.lock().unwrap();
        s.pantry
            .get_mut(&person_id)
            .and_then(|p| p.remove(&ingredient_id))
            .map(|_| ())
            .ok_or_else(|| missing("Pantry ingredient", ingredient_id))
    }

    async fn get_purchase_history(
        &self,
        person_id: i32,
        ingredient_id: i32,
    ) -> PortResult<Vec<PurchaseRecord>> {
        let s = self.store.lock().unwrap();
        let mut records: Vec<PurchaseRecord> = s
            .history
            .iter()
            .filter(|(p, r)| *p == person_id && r.ingredient_id == ingredient_id)
            .map(|(_, r)| r.clone())
            .collect();
        records.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(records)
    }
}

fn apply(s: &mut Store, person_id: i32, changes: &[PantryChange]) {
    for change in changes {
        let quantity = match *change {
            PantryChange::Insert { quantity, .. } | PantryChange::Increase { quantity, .. } => {
                quantity
            }
        };
        s.pantry
            .entry(person_id)
            .or_default()
            .insert(change.ingredient_id(), quantity);
        let id = s.history.len() as i32 + 1;
        s.history.push((
            person_id,
            PurchaseRecord {
                id,
                ingredient_id: change.ingredient_id(),
                quantity: change.purchased(),
                purchase_date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
                unit_name: None,
            },
        ));
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

fn state() -> (Arc<AppState>, Arc<FakeDb>) {
    let db = Arc::new(FakeDb::seeded());
    let config = Config::from_lookup(|key| {
        (key == "DATABASE_URL").then(|| "postgres://localhost/recipes_test".to_string())
    })
    .unwrap();
    let state = Arc::new(AppState {
        db: db.clone(),
        config: Arc::new(config),
    });
    (state, db)
}

async fn body_of(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn respond<T: IntoResponse, E: IntoResponse>(result: Result<T, E>) -> (StatusCode, Value) {
    body_of(result.into_response()).await
}

fn filter(params: Value) -> Query<recipes::RecipeFilterParams> {
    Query(serde_json::from_value(params).unwrap())
}

//=========================================================================================
// Recipes
//=========================================================================================

#[tokio::test]
async fn test_filter_without_matches_is_empty_ok() {
    let (state, _) = state();
    let result =
        recipes::filter_recipes_handler(State(state), filter(json!({"ingredient_name": "saffron"})))
            .await;
    let (status, body) = respond(result).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_ingredient_filter_keeps_every_ingredient() {
    let (state, _) = state();
    let result =
        recipes::filter_recipes_handler(State(state), filter(json!({"ingredient_name": "carrot"})))
            .await;
    let (status, body) = respond(result).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Soup");
    assert_eq!(body[0]["ingredients"], json!(["Carrot", "Flour", "Salt"]));
}

#[tokio::test]
async fn test_filter_sorts_by_cooking_time() {
    let (state, _) = state();
    let result =
        recipes::filter_recipes_handler(State(state), filter(json!({"sort_order": "ASC"}))).await;
    let (_, body) = respond(result).await;
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Soup", "Bread"]);
}

#[tokio::test]
async fn test_invalid_filters_are_rejected() {
    for params in [
        json!({"start_date": "yesterday"}),
        json!({"start_date": "2024-05-10", "end_date": "2024-05-01"}),
        json!({"type_ids": "1,soup"}),
        json!({"sort_order": "sideways"}),
    ] {
        let (state, _) = state();
        let result = recipes::filter_recipes_handler(State(state), filter(params.clone())).await;
        let (status, body) = respond(result).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{params}");
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_update_with_empty_ingredients_keeps_them() {
    let (state, db) = state();
    let req: recipes::RecipeRequest =
        serde_json::from_value(json!({"title": "Soup", "content": "Boil", "ingredients": []}))
            .unwrap();
    let result = recipes::update_recipe_handler(State(state), Path(11), Json(req)).await;
    let (status, _) = respond(result).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        db.store.lock().unwrap().lines[&11],
        vec![line(1, 150.0), line(2, 2.0), line(3, 5.0)]
    );
}

#[tokio::test]
async fn test_empty_ingredients_on_bare_recipe_is_rejected() {
    let (state, db) = state();
    db.store
        .lock()
        .unwrap()
        .recipes
        .push(summary(12, "Water", Some(1), None, day(3)));
    let req: recipes::RecipeRequest =
        serde_json::from_value(json!({"title": "Water", "content": "Pour", "ingredients": []}))
            .unwrap();
    let result = recipes::update_recipe_handler(State(state), Path(12), Json(req)).await;
    let (status, body) = respond(result).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "cannot leave a recipe with no ingredients");
}

#[tokio::test]
async fn test_update_without_ingredients_keeps_them() {
    let (state, db) = state();
    let req: recipes::RecipeRequest =
        serde_json::from_value(json!({"title": "Hearty soup", "content": "Boil longer"})).unwrap();
    let result = recipes::update_recipe_handler(State(state), Path(11), Json(req)).await;
    let (status, body) = respond(result).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Hearty soup");
    assert_eq!(
        db.store.lock().unwrap().lines[&11],
        vec![line(1, 150.0), line(2, 2.0), line(3, 5.0)]
    );
}

#[tokio::test]
async fn test_create_recipe_for_someone_else_is_forbidden() {
    let (state, _) = state();
    let req: recipes::RecipeRequest = serde_json::from_value(
        json!({"title": "Tea", "content": "Steep", "person_id": 2, "ingredients": [3]}),
    )
    .unwrap();
    let result =
        recipes::create_recipe_handler(State(state), Extension(CurrentPerson(1)), Json(req)).await;
    let (status, _) = respond(result).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_recipe_returns_created_row() {
    let (state, _) = state();
    let req: recipes::RecipeRequest = serde_json::from_value(json!({
        "title": "Salted carrots",
        "content": "Slice and salt",
        "cooking_time": 5,
        "ingredients": [2, {"ingredient_id": 3, "quantity": 2}]
    }))
    .unwrap();
    let result =
        recipes::create_recipe_handler(State(state), Extension(CurrentPerson(1)), Json(req)).await;
    let (status, body) = respond(result).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 12);
    assert_eq!(body["person_id"], 1);
}

#[tokio::test]
async fn test_missing_recipe_is_not_found() {
    let (state, _) = state();
    let (status, body) = respond(recipes::get_recipe_handler(State(state.clone()), Path(99)).await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("99"));

    let (status, _) = respond(recipes::delete_recipe_handler(State(state), Path(99)).await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

//=========================================================================================
// Menus
//=========================================================================================

#[tokio::test]
async fn test_menu_detail_reports_missing_ingredients() {
    let (state, _) = state();
    let result =
        menus::get_menu_handler(State(state), Extension(CurrentPerson(1)), Path(50)).await;
    let (status, body) = respond(result).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["menu"]["title"], "Week");

    // 200g and 150g of flour against 100g owned.
    assert_eq!(
        body["missingIngredients"]["Flour"],
        json!({"quantity": 150.0, "unit": "g"})
    );
    assert_eq!(
        body["missingIngredients"]["Carrot"],
        json!({"quantity": 2.0, "unit": "pcs"})
    );
    assert!(body["missingIngredients"].get("Salt").is_none());

    let bread = &body["recipes"][0];
    assert_eq!(bread["title"], "Bread");
    assert_eq!(
        bread["missingIngredients"],
        json!([{
            "ingredient_id": 1,
            "ingredient_name": "Flour",
            "missing_quantity": 100.0,
            "unit_name": "g"
        }])
    );
}

#[tokio::test]
async fn test_menu_list_by_unknown_category_is_empty() {
    let (state, _) = state();
    let params = Query(menus::MenuListParams {
        category_id: Some("7".into()),
    });
    let (status, body) = respond(menus::list_menus_handler(State(state), params).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_menu_list_rejects_non_integer_category() {
    let (state, _) = state();
    let params = Query(menus::MenuListParams {
        category_id: Some("dinner".into()),
    });
    let (status, _) = respond(menus::list_menus_handler(State(state), params).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_menu_requires_recipes() {
    let (state, _) = state();
    let req: menus::MenuRequest =
        serde_json::from_value(json!({"menuTitle": "Empty", "recipeIds": []})).unwrap();
    let result =
        menus::create_menu_handler(State(state), Extension(CurrentPerson(1)), Json(req)).await;
    let (status, _) = respond(result).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_menu_returns_its_id() {
    let (state, _) = state();
    let req: menus::MenuRequest = serde_json::from_value(
        json!({"menuTitle": "Weekend", "menuContent": "Lazy", "categoryId": 1, "personId": 1, "recipeIds": [11]}),
    )
    .unwrap();
    let result =
        menus::create_menu_handler(State(state), Extension(CurrentPerson(1)), Json(req)).await;
    let (status, body) = respond(result).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"menuId": 51}));
}

#[tokio::test]
async fn test_only_the_owner_deletes_a_menu() {
    let (state, db) = state();
    let result =
        menus::delete_menu_handler(State(state.clone()), Extension(CurrentPerson(2)), Path(50))
            .await;
    let (status, _) = respond(result).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(db.store.lock().unwrap().menus.len(), 1);

    let result =
        menus::delete_menu_handler(State(state), Extension(CurrentPerson(1)), Path(50)).await;
    let (status, _) = respond(result).await;
    assert_eq!(status, StatusCode::OK);
    assert!(db.store.lock().unwrap().menus.is_empty());
}

//=========================================================================================
// Pantry
//=========================================================================================

#[tokio::test]
async fn test_pantry_of_another_person_is_forbidden() {
    let (state, _) = state();
    let result =
        pantry::get_pantry_handler(State(state), Extension(CurrentPerson(2)), Path(1)).await;
    let (status, _) = respond(result).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_pantry_lists_expiry() {
    let (state, db) = state();
    db.store.lock().unwrap().pantry.get_mut(&1).unwrap().insert(2, 4.0);
    let result =
        pantry::get_pantry_handler(State(state), Extension(CurrentPerson(1)), Path(1)).await;
    let (status, body) = respond(result).await;
    assert_eq!(status, StatusCode::OK);
    let carrot = &body[0];
    assert_eq!(carrot["name"], "Carrot");
    assert_eq!(carrot["expires_on"], "2024-05-04");
    assert_eq!(carrot["is_expired"], true);
    assert_eq!(body[1]["expires_on"], Value::Null);
    assert_eq!(body[1]["is_expired"], false);
}

#[tokio::test]
async fn test_quantity_update_rejects_non_array() {
    let (state, _) = state();
    let result = pantry::update_pantry_quantities_handler(
        State(state),
        Extension(CurrentPerson(1)),
        Path(1),
        Json(json!({"id": 1, "quantity_person_ingradient": 500})),
    )
    .await;
    let (status, _) = respond(result).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_quantity_update_rejects_decrease() {
    let (state, db) = state();
    let result = pantry::update_pantry_quantities_handler(
        State(state),
        Extension(CurrentPerson(1)),
        Path(1),
        Json(json!([{"id": 1, "quantity_person_ingradient": 50}])),
    )
    .await;
    let (status, _) = respond(result).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(db.store.lock().unwrap().pantry[&1][&1], 100.0);
}

#[tokio::test]
async fn test_quantity_increase_is_recorded_as_purchase() {
    let (state, _) = state();
    let result = pantry::update_pantry_quantities_handler(
        State(state.clone()),
        Extension(CurrentPerson(1)),
        Path(1),
        Json(json!({"updatedIngredients": [{"id": 1, "quantity_person_ingradient": 400}]})),
    )
    .await;
    let (status, _) = respond(result).await;
    assert_eq!(status, StatusCode::OK);

    let result = pantry::purchase_history_handler(
        State(state),
        Extension(CurrentPerson(1)),
        Path((1, 1)),
    )
    .await;
    let (status, body) = respond(result).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["quantity"], 300.0);
}

#[tokio::test]
async fn test_adding_owned_ingredient_leaves_it_untouched() {
    let (state, db) = state();
    let req: pantry::AddPantryRequest =
        serde_json::from_value(json!({"ingredients": [{"id": 1, "quantity": 5}, {"id": 2}]}))
            .unwrap();
    let result =
        pantry::add_pantry_items_handler(State(state), Extension(CurrentPerson(1)), Path(1), Json(req))
            .await;
    let (status, _) = respond(result).await;
    assert_eq!(status, StatusCode::OK);
    let store = db.store.lock().unwrap();
    assert_eq!(store.pantry[&1][&1], 100.0);
    assert_eq!(store.pantry[&1][&2], 1.0);
}

#[tokio::test]
async fn test_removing_unowned_ingredient_is_not_found() {
    let (state, _) = state();
    let result = pantry::remove_pantry_item_handler(
        State(state),
        Extension(CurrentPerson(1)),
        Path((1, 2)),
    )
    .await;
    let (status, _) = respond(result).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
