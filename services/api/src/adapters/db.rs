//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Every multi-statement write runs inside one transaction. A transaction that is
//! dropped before `commit` (any early `?` return) is rolled back and its
//! connection goes back to the pool.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use recipe_book_core::domain::{
    Ingredient, IngredientLine, Menu, MenuCategory, MenuDraft, MenuRecipe, NewPerson,
    PantryAddition, PantryItem, Person, PersonCredentials, PurchaseRecord, QuantityUpdate, Recipe,
    RecipeDetail, RecipeDraft, RecipeIngredient, RecipeSummary, RecipeType, RecipeTypeDraft,
    RecipeUpdate,
};
use recipe_book_core::filter::RecipeFilter;
use recipe_book_core::pantry::{plan_additions, plan_quantity_updates, PantryChange};
use recipe_book_core::ports::{DatabaseService, PortError, PortResult};
use recipe_book_core::validation::resolve_ingredient_set;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::recipe_query;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// Error Mapping
//=========================================================================================

const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";

/// Turns driver errors into port errors. Constraint violations are caused by
/// the request, so they are reported as such instead of as server failures.
fn map_db_error(e: sqlx::Error) -> PortError {
    if let Some(db_err) = e.as_database_error() {
        let constraint = db_err.constraint().unwrap_or("unknown").to_string();
        match db_err.code().as_deref() {
            Some(FOREIGN_KEY_VIOLATION) => {
                return PortError::NotFound(format!(
                    "Referenced record does not exist ({})",
                    constraint
                ))
            }
            Some(UNIQUE_VIOLATION) => {
                return PortError::Conflict(format!("Duplicate value ({})", constraint))
            }
            _ => {}
        }
    }
    PortError::Unexpected(e.to_string())
}

fn not_found(what: &str, id: impl std::fmt::Display) -> PortError {
    PortError::NotFound(format!("{} {} not found", what, id))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct PersonRecord {
    id: i32,
    name: String,
    surname: String,
    login: String,
}
impl PersonRecord {
    fn to_domain(self) -> Person {
        Person {
            id: self.id,
            name: self.name,
            surname: self.surname,
            login: self.login,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: i32,
    login: String,
    password_hash: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> PersonCredentials {
        PersonCredentials {
            id: self.id,
            login: self.login,
            hashed_password: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct IngredientRecord {
    id: i32,
    name: String,
    unit_name: Option<String>,
    allergens: Option<String>,
    days_to_expire: Option<i32>,
    seasonality: Option<String>,
    storage_condition: Option<String>,
}
impl IngredientRecord {
    fn to_domain(self) -> Ingredient {
        Ingredient {
            id: self.id,
            name: self.name,
            unit_name: self.unit_name,
            allergens: self.allergens,
            days_to_expire: self.days_to_expire,
            seasonality: self.seasonality,
            storage_condition: self.storage_condition,
        }
    }
}

#[derive(FromRow)]
struct RecipeTypeRecord {
    id: i32,
    type_name: String,
    description: Option<String>,
}
impl RecipeTypeRecord {
    fn to_domain(self) -> RecipeType {
        RecipeType {
            id: self.id,
            type_name: self.type_name,
            description: self.description,
        }
    }
}

#[derive(FromRow)]
struct RecipeRecord {
    id: i32,
    title: String,
    content: String,
    person_id: Option<i32>,
    type_id: Option<i32>,
    cooking_time: Option<i32>,
    creation_date: DateTime<Utc>,
}
impl RecipeRecord {
    fn to_domain(self) -> Recipe {
        Recipe {
            id: self.id,
            title: self.title,
            content: self.content,
            person_id: self.person_id,
            type_id: self.type_id,
            cooking_time: self.cooking_time,
            creation_date: self.creation_date,
        }
    }
}

#[derive(FromRow)]
struct RecipeWithTypeRecord {
    #[sqlx(flatten)]
    recipe: RecipeRecord,
    type_name: Option<String>,
}

#[derive(FromRow)]
struct RecipeSummaryRecord {
    id: i32,
    title: String,
    content: String,
    person_id: Option<i32>,
    type_id: Option<i32>,
    type_name: Option<String>,
    cooking_time: Option<i32>,
    creation_date: DateTime<Utc>,
    ingredients: Vec<String>,
}
impl RecipeSummaryRecord {
    fn to_domain(self) -> RecipeSummary {
        RecipeSummary {
            id: self.id,
            title: self.title,
            content: self.content,
            person_id: self.person_id,
            type_id: self.type_id,
            type_name: self.type_name,
            cooking_time: self.cooking_time,
            creation_date: self.creation_date,
            ingredients: self.ingredients,
        }
    }
}

#[derive(FromRow)]
struct RecipeIngredientRecord {
    recipe_id: i32,
    ingredient_id: i32,
    name: String,
    quantity: f64,
    unit_name: Option<String>,
}
impl RecipeIngredientRecord {
    fn to_domain(self) -> RecipeIngredient {
        RecipeIngredient {
            ingredient_id: self.ingredient_id,
            name: self.name,
            quantity: self.quantity,
            unit_name: self.unit_name,
        }
    }
}

#[derive(FromRow)]
struct MenuCategoryRecord {
    id: i32,
    category_name: String,
}

#[derive(FromRow)]
struct MenuRecord {
    id: i32,
    title: String,
    content: Option<String>,
    category_id: Option<i32>,
    category_name: Option<String>,
    person_id: i32,
}
impl MenuRecord {
    fn to_domain(self) -> Menu {
        Menu {
            id: self.id,
            title: self.title,
            content: self.content,
            category_id: self.category_id,
            category_name: self.category_name,
            person_id: self.person_id,
        }
    }
}

#[derive(FromRow)]
struct PantryRecord {
    ingredient_id: i32,
    ingredient_name: String,
    unit_name: Option<String>,
    quantity: f64,
    purchase_date: NaiveDate,
    allergens: Option<String>,
    days_to_expire: Option<i32>,
    seasonality: Option<String>,
    storage_condition: Option<String>,
}
impl PantryRecord {
    fn to_domain(self) -> PantryItem {
        PantryItem {
            ingredient_id: self.ingredient_id,
            ingredient_name: self.ingredient_name,
            unit_name: self.unit_name,
            quantity: self.quantity,
            purchase_date: self.purchase_date,
            allergens: self.allergens,
            days_to_expire: self.days_to_expire,
            seasonality: self.seasonality,
            storage_condition: self.storage_condition,
        }
    }
}

#[derive(FromRow)]
struct PurchaseRecordRow {
    id: i32,
    ingredient_id: i32,
    quantity: f64,
    purchase_date: NaiveDate,
    unit_name: Option<String>,
}
impl PurchaseRecordRow {
    fn to_domain(self) -> PurchaseRecord {
        PurchaseRecord {
            id: self.id,
            ingredient_id: self.ingredient_id,
            quantity: self.quantity,
            purchase_date: self.purchase_date,
            unit_name: self.unit_name,
        }
    }
}

//=========================================================================================
// Shared Statements
//=========================================================================================

const RECIPE_COLUMNS: &str = "id, title, content, person_id, type_id, cooking_time, creation_date";

const MENU_SELECT: &str = "SELECT m.id, m.title, m.content, m.category_id, mc.category_name, m.person_id \
     FROM menus m LEFT JOIN menu_category mc ON mc.id = m.category_id";

const PANTRY_SELECT: &str = "SELECT pi.ingredient_id, i.name AS ingredient_name, u.unit_name, \
     pi.quantity, pi.purchase_date, i.allergens, i.days_to_expire, i.seasonality, i.storage_condition \
     FROM person_ingredients pi \
     JOIN ingredients i ON i.id = pi.ingredient_id \
     LEFT JOIN units_of_measure u ON u.id = i.unit_id";

async fn insert_recipe_ingredients(
    conn: &mut PgConnection,
    recipe_id: i32,
    lines: &[IngredientLine],
) -> Result<(), sqlx::Error> {
    if lines.is_empty() {
        return Ok(());
    }
    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, quantity) ");
    query.push_values(lines, |mut row, line| {
        row.push_bind(recipe_id)
            .push_bind(line.ingredient_id)
            .push_bind(line.quantity);
    });
    query.build().execute(&mut *conn).await?;
    Ok(())
}

async fn insert_menu_recipes(
    conn: &mut PgConnection,
    menu_id: i32,
    recipe_ids: &[i32],
) -> Result<(), sqlx::Error> {
    if recipe_ids.is_empty() {
        return Ok(());
    }
    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO menu_recipe (menu_id, recipe_id, position) ");
    query.push_values(recipe_ids.iter().enumerate(), |mut row, (position, recipe_id)| {
        row.push_bind(menu_id)
            .push_bind(*recipe_id)
            .push_bind(position as i32);
    });
    query.build().execute(&mut *conn).await?;
    Ok(())
}

/// Current pantry quantities of a person, locked for the rest of the transaction.
async fn lock_pantry(
    conn: &mut PgConnection,
    person_id: i32,
) -> Result<HashMap<i32, f64>, sqlx::Error> {
    let rows: Vec<(i32, f64)> = sqlx::query_as(
        "SELECT ingredient_id, quantity FROM person_ingredients WHERE person_id = $1 FOR UPDATE",
    )
    .bind(person_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows.into_iter().collect())
}

/// Writes planned pantry changes and records each one as a purchase.
async fn apply_pantry_changes(
    conn: &mut PgConnection,
    person_id: i32,
    changes: &[PantryChange],
) -> Result<(), sqlx::Error> {
    for change in changes {
        match *change {
            PantryChange::Insert {
                ingredient_id,
                quantity,
            } => {
                sqlx::query(
                    "INSERT INTO person_ingredients (person_id, ingredient_id, quantity, purchase_date) \
                     VALUES ($1, $2, $3, CURRENT_DATE)",
                )
                .bind(person_id)
                .bind(ingredient_id)
                .bind(quantity)
                .execute(&mut *conn)
                .await?;
            }
            PantryChange::Increase {
                ingredient_id,
                quantity,
                ..
            } => {
                sqlx::query(
                    "UPDATE person_ingredients SET quantity = $3, purchase_date = CURRENT_DATE \
                     WHERE person_id = $1 AND ingredient_id = $2",
                )
                .bind(person_id)
                .bind(ingredient_id)
                .bind(quantity)
                .execute(&mut *conn)
                .await?;
            }
        }

        sqlx::query(
            "INSERT INTO purchase_history (person_id, ingredient_id, quantity, purchase_date) \
             VALUES ($1, $2, $3, CURRENT_DATE)",
        )
        .bind(person_id)
        .bind(change.ingredient_id())
        .bind(change.purchased())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    // --- Person & Auth Management ---

    async fn create_person(&self, person: &NewPerson) -> PortResult<Person> {
        let record: PersonRecord = sqlx::query_as(
            "INSERT INTO persons (name, surname, login, password_hash) VALUES ($1, $2, $3, $4) \
             RETURNING id, name, surname, login",
        )
        .bind(&person.name)
        .bind(&person.surname)
        .bind(&person.login)
        .bind(&person.hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match map_db_error(e) {
            PortError::Conflict(_) => {
                PortError::Conflict(format!("Login '{}' is already taken", person.login))
            }
            other => other,
        })?;
        Ok(record.to_domain())
    }

    async fn get_person_credentials(&self, login: &str) -> PortResult<PersonCredentials> {
        let record: CredentialsRecord =
            sqlx::query_as("SELECT id, login, password_hash FROM persons WHERE login = $1")
                .bind(login)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_error)?
                .ok_or_else(|| not_found("Person", login))?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        person_id: i32,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, person_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(person_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<i32> {
        sqlx::query_scalar::<_, i32>(
            "SELECT person_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?
        .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    // --- Ingredients ---

    async fn list_ingredients(&self) -> PortResult<Vec<Ingredient>> {
        let records: Vec<IngredientRecord> = sqlx::query_as(
            "SELECT i.id, i.name, u.unit_name, i.allergens, i.days_to_expire, i.seasonality, \
             i.storage_condition \
             FROM ingredients i LEFT JOIN units_of_measure u ON u.id = i.unit_id \
             ORDER BY i.name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    // --- Recipe Types ---

    async fn list_recipe_types(&self) -> PortResult<Vec<RecipeType>> {
        let records: Vec<RecipeTypeRecord> =
            sqlx::query_as("SELECT id, type_name, description FROM recipe_types ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(map_db_error)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_recipe_type(&self, type_id: i32) -> PortResult<RecipeType> {
        let record: RecipeTypeRecord =
            sqlx::query_as("SELECT id, type_name, description FROM recipe_types WHERE id = $1")
                .bind(type_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_error)?
                .ok_or_else(|| not_found("Recipe type", type_id))?;
        Ok(record.to_domain())
    }

    async fn create_recipe_type(&self, draft: &RecipeTypeDraft) -> PortResult<RecipeType> {
        let record: RecipeTypeRecord = sqlx::query_as(
            "INSERT INTO recipe_types (type_name, description) VALUES ($1, $2) \
             RETURNING id, type_name, description",
        )
        .bind(&draft.type_name)
        .bind(&draft.description)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(record.to_domain())
    }

    async fn update_recipe_type(
        &self,
        type_id: i32,
        draft: &RecipeTypeDraft,
    ) -> PortResult<RecipeType> {
        let record: RecipeTypeRecord = sqlx::query_as(
            "UPDATE recipe_types SET type_name = $1, description = $2 WHERE id = $3 \
             RETURNING id, type_name, description",
        )
        .bind(&draft.type_name)
        .bind(&draft.description)
        .bind(type_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| not_found("Recipe type", type_id))?;
        Ok(record.to_domain())
    }

    async fn delete_recipe_type(&self, type_id: i32) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let in_use: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE type_id = $1")
            .bind(type_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_error)?;
        if in_use > 0 {
            return Err(PortError::Conflict(format!(
                "Recipe type {} is still used by {} recipe(s)",
                type_id, in_use
            )));
        }

        let deleted = sqlx::query("DELETE FROM recipe_types WHERE id = $1")
            .bind(type_id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        if deleted.rows_affected() == 0 {
            return Err(not_found("Recipe type", type_id));
        }

        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    // --- Recipes ---

    async fn search_recipes(&self, filter: &RecipeFilter) -> PortResult<Vec<RecipeSummary>> {
        let mut query = recipe_query::search_query(filter);
        debug!("Recipe search: {}", query.sql());
        let records: Vec<RecipeSummaryRecord> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_recipe(&self, recipe_id: i32) -> PortResult<RecipeDetail> {
        let record: RecipeWithTypeRecord = sqlx::query_as(
            "SELECT r.id, r.title, r.content, r.person_id, r.type_id, r.cooking_time, \
             r.creation_date, rt.type_name \
             FROM recipes r LEFT JOIN recipe_types rt ON rt.id = r.type_id WHERE r.id = $1",
        )
        .bind(recipe_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| not_found("Recipe", recipe_id))?;

        let ingredients: Vec<RecipeIngredientRecord> = sqlx::query_as(
            "SELECT ri.recipe_id, ri.ingredient_id, i.name, ri.quantity, u.unit_name \
             FROM recipe_ingredients ri \
             JOIN ingredients i ON i.id = ri.ingredient_id \
             LEFT JOIN units_of_measure u ON u.id = i.unit_id \
             WHERE ri.recipe_id = $1 ORDER BY i.name",
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(RecipeDetail {
            recipe: record.recipe.to_domain(),
            type_name: record.type_name,
            ingredients: ingredients.into_iter().map(|r| r.to_domain()).collect(),
        })
    }

    async fn create_recipe(&self, draft: &RecipeDraft) -> PortResult<Recipe> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let record: RecipeRecord = sqlx::query_as(&format!(
            "INSERT INTO recipes (title, content, person_id, type_id, cooking_time) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            RECIPE_COLUMNS
        ))
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(draft.person_id)
        .bind(draft.type_id)
        .bind(draft.cooking_time)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        insert_recipe_ingredients(&mut tx, record.id, &draft.ingredients)
            .await
            .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;
        Ok(record.to_domain())
    }

    async fn update_recipe(&self, recipe_id: i32, update: &RecipeUpdate) -> PortResult<Recipe> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        // creation_date is never part of an update.
        let record: RecipeRecord = sqlx::query_as(&format!(
            "UPDATE recipes SET title = $1, content = $2, type_id = $3, cooking_time = $4 \
             WHERE id = $5 RETURNING {}",
            RECIPE_COLUMNS
        ))
        .bind(&update.title)
        .bind(&update.content)
        .bind(update.type_id)
        .bind(update.cooking_time)
        .bind(recipe_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| not_found("Recipe", recipe_id))?;

        let replacing = update.ingredients.as_ref().is_some_and(|l| !l.is_empty());
        let existing = if replacing {
            Vec::new()
        } else {
            let rows: Vec<(i32, f64)> = sqlx::query_as(
                "SELECT ingredient_id, quantity FROM recipe_ingredients WHERE recipe_id = $1",
            )
            .bind(recipe_id)
            .fetch_all(&mut *tx)
            .await
            .map_err(map_db_error)?;
            rows.into_iter()
                .map(|(ingredient_id, quantity)| IngredientLine {
                    ingredient_id,
                    quantity,
                })
                .collect()
        };
        let lines = resolve_ingredient_set(update.ingredients.as_deref(), existing)?;

        if replacing {
            sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
                .bind(recipe_id)
                .execute(&mut *tx)
                .await
                .map_err(map_db_error)?;
            insert_recipe_ingredients(&mut tx, recipe_id, &lines)
                .await
                .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)?;
        Ok(record.to_domain())
    }

    async fn delete_recipe(&self, recipe_id: i32) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        sqlx::query("DELETE FROM menu_recipe WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        let deleted = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        if deleted.rows_affected() == 0 {
            return Err(not_found("Recipe", recipe_id));
        }

        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    // --- Menus ---

    async fn list_menu_categories(&self) -> PortResult<Vec<MenuCategory>> {
        let records: Vec<MenuCategoryRecord> =
            sqlx::query_as("SELECT id, category_name FROM menu_category ORDER BY category_name")
                .fetch_all(&self.pool)
                .await
                .map_err(map_db_error)?;
        Ok(records
            .into_iter()
            .map(|r| MenuCategory {
                id: r.id,
                category_name: r.category_name,
            })
            .collect())
    }

    async fn list_menus(&self, category_id: Option<i32>) -> PortResult<Vec<Menu>> {
        let records: Vec<MenuRecord> = sqlx::query_as(&format!(
            "{} WHERE ($1::INTEGER IS NULL OR m.category_id = $1) ORDER BY m.id",
            MENU_SELECT
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_menu(&self, menu_id: i32) -> PortResult<Menu> {
        let record: MenuRecord = sqlx::query_as(&format!("{} WHERE m.id = $1", MENU_SELECT))
            .bind(menu_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?
            .ok_or_else(|| not_found("Menu", menu_id))?;
        Ok(record.to_domain())
    }

    async fn get_menu_recipes(&self, menu_id: i32) -> PortResult<Vec<MenuRecipe>> {
        let summaries: Vec<RecipeSummaryRecord> = recipe_query::menu_recipes_query(menu_id)
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        let requirement_rows: Vec<RecipeIngredientRecord> = sqlx::query_as(
            "SELECT ri.recipe_id, ri.ingredient_id, i.name, ri.quantity, u.unit_name \
             FROM menu_recipe mr \
             JOIN recipe_ingredients ri ON ri.recipe_id = mr.recipe_id \
             JOIN ingredients i ON i.id = ri.ingredient_id \
             LEFT JOIN units_of_measure u ON u.id = i.unit_id \
             WHERE mr.menu_id = $1 ORDER BY i.name",
        )
        .bind(menu_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        let mut requirements: HashMap<i32, Vec<RecipeIngredient>> = HashMap::new();
        for row in requirement_rows {
            requirements
                .entry(row.recipe_id)
                .or_default()
                .push(row.to_domain());
        }

        Ok(summaries
            .into_iter()
            .map(|summary| MenuRecipe {
                requirements: requirements.remove(&summary.id).unwrap_or_default(),
                recipe: summary.to_domain(),
            })
            .collect())
    }

    async fn create_menu(&self, draft: &MenuDraft) -> PortResult<i32> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let menu_id: i32 = sqlx::query_scalar(
            "INSERT INTO menus (title, content, category_id, person_id) VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(draft.category_id)
        .bind(draft.person_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        insert_menu_recipes(&mut tx, menu_id, &draft.recipe_ids)
            .await
            .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;
        Ok(menu_id)
    }

    async fn update_menu(&self, menu_id: i32, draft: &MenuDraft) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let updated = sqlx::query(
            "UPDATE menus SET title = $1, content = $2, category_id = $3 WHERE id = $4",
        )
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(draft.category_id)
        .bind(menu_id)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;
        if updated.rows_affected() == 0 {
            return Err(not_found("Menu", menu_id));
        }

        sqlx::query("DELETE FROM menu_recipe WHERE menu_id = $1")
            .bind(menu_id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        insert_menu_recipes(&mut tx, menu_id, &draft.recipe_ids)
            .await
            .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    async fn delete_menu(&self, menu_id: i32) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query("DELETE FROM menu_recipe WHERE menu_id = $1")
            .bind(menu_id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        let deleted = sqlx::query("DELETE FROM menus WHERE id = $1")
            .bind(menu_id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        if deleted.rows_affected() == 0 {
            return Err(not_found("Menu", menu_id));
        }

        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    // --- Pantry ---

    async fn get_pantry(&self, person_id: i32) -> PortResult<Vec<PantryItem>> {
        let records: Vec<PantryRecord> = sqlx::query_as(&format!(
            "{} WHERE pi.person_id = $1 ORDER BY i.name",
            PANTRY_SELECT
        ))
        .bind(person_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn add_pantry_items(
        &self,
        person_id: i32,
        additions: &[PantryAddition],
    ) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        let current = lock_pantry(&mut tx, person_id)
            .await
            .map_err(map_db_error)?;
        let changes = plan_additions(&current, additions)?;
        apply_pantry_changes(&mut tx, person_id, &changes)
            .await
            .map_err(map_db_error)?;
        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    async fn update_pantry_quantities(
        &self,
        person_id: i32,
        updates: &[QuantityUpdate],
    ) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        let current = lock_pantry(&mut tx, person_id)
            .await
            .map_err(map_db_error)?;
        let changes = plan_quantity_updates(&current, updates)?;
        apply_pantry_changes(&mut tx, person_id, &changes)
            .await
            .map_err(map_db_error)?;
        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    async fn remove_pantry_item(&self, person_id: i32, ingredient_id: i32) -> PortResult<()> {
        let deleted =
            sqlx::query("DELETE FROM person_ingredients WHERE person_id = $1 AND ingredient_id = $2")
                .bind(person_id)
                .bind(ingredient_id)
                .execute(&self.pool)
                .await
                .map_err(map_db_error)?;
        if deleted.rows_affected() == 0 {
            return Err(not_found("Pantry ingredient", ingredient_id));
        }
        Ok(())
    }

    async fn get_purchase_history(
        &self,
        person_id: i32,
        ingredient_id: i32,
    ) -> PortResult<Vec<PurchaseRecord>> {
        let records: Vec<PurchaseRecordRow> = sqlx::query_as(
            "SELECT ph.id, ph.ingredient_id, ph.quantity, ph.purchase_date, u.unit_name \
             FROM purchase_history ph \
             JOIN ingredients i ON i.id = ph.ingredient_id \
             LEFT JOIN units_of_measure u ON u.id = i.unit_id \
             WHERE ph.person_id = $1 AND ph.ingredient_id = $2 \
             ORDER BY ph.purchase_date DESC, ph.id DESC",
        )
        .bind(person_id)
        .bind(ingredient_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}
