//! services/api/src/adapters/recipe_query.rs
//!
//! Compiles a `RecipeFilter` into a parameterized PostgreSQL query. Every value
//! is bound; only fixed SQL fragments are pushed as text.

use recipe_book_core::filter::{Predicate, RecipeFilter, SortKey, SortOrder};
use sqlx::{Postgres, QueryBuilder};

/// Recipe summaries with their type name and aggregated ingredient names.
/// The ingredient joins are never restricted by the filter, so the
/// aggregate always lists every ingredient of a recipe.
pub const SUMMARY_SELECT: &str = "SELECT r.id, r.title, r.content, r.person_id, r.type_id, \
     rt.type_name, r.cooking_time, r.creation_date, \
     COALESCE(ARRAY_AGG(DISTINCT i.name ORDER BY i.name) FILTER (WHERE i.name IS NOT NULL), \
     ARRAY[]::TEXT[]) AS ingredients \
     FROM recipes r \
     LEFT JOIN recipe_types rt ON rt.id = r.type_id \
     LEFT JOIN recipe_ingredients ri ON ri.recipe_id = r.id \
     LEFT JOIN ingredients i ON i.id = ri.ingredient_id";

const SUMMARY_GROUP_BY: &str = " GROUP BY r.id, rt.type_name";

/// Builds the search query for a filter.
pub fn search_query(filter: &RecipeFilter) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(SUMMARY_SELECT);
    query.push(" WHERE TRUE");
    for predicate in filter.predicates() {
        query.push(" AND ");
        push_predicate(&mut query, predicate);
    }
    query.push(SUMMARY_GROUP_BY);

    query.push(" ORDER BY ");
    let mut keys = query.separated(", ");
    for key in filter.order_by() {
        keys.push(order_fragment(key));
    }
    query
}

/// Summaries of the recipes of one menu, in the order they were added.
pub fn menu_recipes_query(menu_id: i32) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(SUMMARY_SELECT);
    query.push(" JOIN menu_recipe mr ON mr.recipe_id = r.id WHERE mr.menu_id = ");
    query.push_bind(menu_id);
    query.push(SUMMARY_GROUP_BY);
    query.push(", mr.position ORDER BY mr.position, r.id");
    query
}

fn push_predicate(query: &mut QueryBuilder<'static, Postgres>, predicate: Predicate) {
    match predicate {
        Predicate::IngredientNameContains(name) => {
            query.push(
                "EXISTS (SELECT 1 FROM recipe_ingredients fri \
                 JOIN ingredients fi ON fi.id = fri.ingredient_id \
                 WHERE fri.recipe_id = r.id AND fi.name ILIKE ",
            );
            query.push_bind(like_pattern(&name));
            query.push(" ESCAPE '\\')");
        }
        Predicate::TypeIn(type_ids) => {
            query.push("r.type_id = ANY(");
            query.push_bind(type_ids);
            query.push(")");
        }
        Predicate::CreatedFrom(start) => {
            query.push("r.creation_date >= ");
            query.push_bind(start);
        }
        Predicate::CreatedUntil(end) => {
            query.push("r.creation_date <= ");
            query.push_bind(end);
        }
        Predicate::OwnedBy(person_id) => {
            query.push("r.person_id = ");
            query.push_bind(person_id);
        }
    }
}

fn order_fragment(key: SortKey) -> &'static str {
    match key {
        SortKey::CookingTime(SortOrder::Asc) => "r.cooking_time ASC NULLS LAST",
        SortKey::CookingTime(SortOrder::Desc) => "r.cooking_time DESC NULLS LAST",
        SortKey::Title => "r.title COLLATE \"C\" ASC",
        SortKey::Id => "r.id ASC",
    }
}

/// Wraps text for a literal substring ILIKE match.
pub fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipe_book_core::filter::RawRecipeFilter;

    fn filter(raw: RawRecipeFilter) -> RecipeFilter {
        RecipeFilter::parse(raw).unwrap()
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("carrot"), "%carrot%");
        assert_eq!(like_pattern("50%_a\\b"), "%50\\%\\_a\\\\b%");
    }

    #[test]
    fn test_unfiltered_query_orders_by_id() {
        let query = search_query(&RecipeFilter::default());
        let sql = query.sql();
        assert!(sql.ends_with("WHERE TRUE GROUP BY r.id, rt.type_name ORDER BY r.id ASC"));
        assert!(!sql.contains('$'));
    }

    #[test]
    fn test_ingredient_filter_is_an_existence_check() {
        let query = search_query(&filter(RawRecipeFilter {
            ingredient_name: Some("carrot".into()),
            ..Default::default()
        }));
        let sql = query.sql();
        assert!(sql.contains("AND EXISTS (SELECT 1 FROM recipe_ingredients fri"));
        assert!(sql.contains("fi.name ILIKE $1 ESCAPE '\\'"));
        // The aggregated join stays unrestricted.
        assert!(!sql.contains("AND i.name"));
    }

    #[test]
    fn test_all_criteria_bind_in_order() {
        let query = search_query(&filter(RawRecipeFilter {
            ingredient_name: Some("salt".into()),
            type_ids: Some("1,2".into()),
            start_date: Some("2024-01-01".into()),
            end_date: Some("2024-12-31".into()),
            sort_order: Some("desc".into()),
        }).owned_by(7));
        let sql = query.sql();
        assert!(sql.contains("r.type_id = ANY($2)"));
        assert!(sql.contains("r.creation_date >= $3"));
        assert!(sql.contains("r.creation_date <= $4"));
        assert!(sql.contains("r.person_id = $5"));
        assert!(sql.ends_with(
            "ORDER BY r.cooking_time DESC NULLS LAST, r.title COLLATE \"C\" ASC, r.id ASC"
        ));
    }

    #[test]
    fn test_user_text_never_reaches_sql() {
        let query = search_query(&filter(RawRecipeFilter {
            ingredient_name: Some("'; DROP TABLE recipes; --".into()),
            ..Default::default()
        }));
        assert!(!query.sql().contains("DROP TABLE"));
    }

    #[test]
    fn test_menu_recipes_query_keeps_menu_order() {
        let query = menu_recipes_query(3);
        let sql = query.sql();
        assert!(sql.contains("WHERE mr.menu_id = $1"));
        assert!(sql.ends_with("GROUP BY r.id, rt.type_name, mr.position ORDER BY mr.position, r.id"));
    }
}
