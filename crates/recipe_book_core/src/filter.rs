//! crates/recipe_book_core/src/filter.rs
//!
//! The recipe filter model. Raw query parameters are parsed into a
//! `RecipeFilter`, which exposes its criteria as a list of typed predicates
//! and an explicit ordering. Storage adapters compile those into their own
//! query language; `RecipeFilter::apply` evaluates the same predicates and
//! ordering in memory. Titles compare by bytes, so SQL adapters must order them
//! with a byte-order collation.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::domain::RecipeSummary;
use crate::validation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ValidationError::InvalidSortOrder(s.to_string())),
        }
    }
}

/// A single criterion. All predicates of a filter are combined with AND.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// At least one of the recipe's ingredients contains the text, ignoring case.
    /// Tested as an existence check, so the recipe still lists every ingredient.
    IngredientNameContains(String),
    TypeIn(Vec<i32>),
    /// Inclusive lower bound on `creation_date`.
    CreatedFrom(DateTime<Utc>),
    /// Inclusive upper bound on `creation_date`.
    CreatedUntil(DateTime<Utc>),
    OwnedBy(i32),
}

/// One component of the result ordering, applied left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Recipes without a cooking time always sort last.
    CookingTime(SortOrder),
    Title,
    Id,
}

/// Query parameters exactly as received.
#[derive(Debug, Clone, Default)]
pub struct RawRecipeFilter {
    pub ingredient_name: Option<String>,
    pub type_ids: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub sort_order: Option<String>,
}

/// A validated set of recipe search criteria. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeFilter {
    pub ingredient_name: Option<String>,
    pub type_ids: Option<Vec<i32>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub sort_order: Option<SortOrder>,
    pub person_id: Option<i32>,
}

impl RecipeFilter {
    /// Validates raw parameters. Bad dates, an inverted range, a non-integer
    /// type id or an unknown sort order are rejected before any query runs.
    pub fn parse(raw: RawRecipeFilter) -> Result<Self, ValidationError> {
        let ingredient_name = raw
            .ingredient_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        let type_ids = raw
            .type_ids
            .as_deref()
            .map(parse_type_ids)
            .transpose()?
            .filter(|ids| !ids.is_empty());

        let start_date = parse_bound("start_date", raw.start_date.as_deref(), Bound::Start)?;
        let end_date = parse_bound("end_date", raw.end_date.as_deref(), Bound::End)?;
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(ValidationError::InvertedDateRange);
            }
        }

        let sort_order = raw
            .sort_order
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(SortOrder::from_str)
            .transpose()?;

        Ok(Self {
            ingredient_name,
            type_ids,
            start_date,
            end_date,
            sort_order,
            person_id: None,
        })
    }

    /// Restricts the filter to recipes owned by one person.
    pub fn owned_by(mut self, person_id: i32) -> Self {
        self.person_id = Some(person_id);
        self
    }

    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(name) = &self.ingredient_name {
            predicates.push(Predicate::IngredientNameContains(name.clone()));
        }
        if let Some(type_ids) = &self.type_ids {
            predicates.push(Predicate::TypeIn(type_ids.clone()));
        }
        if let Some(start) = self.start_date {
            predicates.push(Predicate::CreatedFrom(start));
        }
        if let Some(end) = self.end_date {
            predicates.push(Predicate::CreatedUntil(end));
        }
        if let Some(person_id) = self.person_id {
            predicates.push(Predicate::OwnedBy(person_id));
        }
        predicates
    }

    /// Cooking time first when a sort order was requested, then title and id
    /// so that ties always come back in the same order.
    pub fn order_by(&self) -> Vec<SortKey> {
        match self.sort_order {
            Some(order) => vec![SortKey::CookingTime(order), SortKey::Title, SortKey::Id],
            None => vec![SortKey::Id],
        }
    }

    /// Filters and orders recipes in memory with the same semantics the
    /// database query has.
    pub fn apply(&self, recipes: Vec<RecipeSummary>) -> Vec<RecipeSummary> {
        let predicates = self.predicates();
        let mut matched: Vec<RecipeSummary> = recipes
            .into_iter()
            .filter(|recipe| predicates.iter().all(|p| p.matches(recipe)))
            .collect();
        let keys = self.order_by();
        matched.sort_by(|a, b| {
            keys.iter()
                .map(|key| key.compare(a, b))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        matched
    }
}

impl Predicate {
    pub fn matches(&self, recipe: &RecipeSummary) -> bool {
        match self {
            Predicate::IngredientNameContains(needle) => {
                let needle = needle.to_lowercase();
                recipe
                    .ingredients
                    .iter()
                    .any(|name| name.to_lowercase().contains(&needle))
            }
            Predicate::TypeIn(type_ids) => recipe
                .type_id
                .is_some_and(|type_id| type_ids.contains(&type_id)),
            Predicate::CreatedFrom(start) => recipe.creation_date >= *start,
            Predicate::CreatedUntil(end) => recipe.creation_date <= *end,
            Predicate::OwnedBy(person_id) => recipe.person_id == Some(*person_id),
        }
    }
}

impl SortKey {
    fn compare(&self, a: &RecipeSummary, b: &RecipeSummary) -> Ordering {
        match self {
            SortKey::CookingTime(order) => match (a.cooking_time, b.cooking_time) {
                (Some(x), Some(y)) => match order {
                    SortOrder::Asc => x.cmp(&y),
                    SortOrder::Desc => y.cmp(&x),
                },
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            // Byte order, not locale order.
            SortKey::Title => a.title.cmp(&b.title),
            SortKey::Id => a.id.cmp(&b.id),
        }
    }
}

fn parse_type_ids(raw: &str) -> Result<Vec<i32>, ValidationError> {
    raw.split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            segment
                .parse::<i32>()
                .map_err(|_| ValidationError::InvalidTypeId(segment.to_string()))
        })
        .collect()
}

#[derive(Clone, Copy)]
enum Bound {
    Start,
    End,
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates. A plain date
/// covers the whole day on whichever side it bounds.
fn parse_bound(
    field: &'static str,
    raw: Option<&str>,
    bound: Bound,
) -> Result<Option<DateTime<Utc>>, ValidationError> {
    let value = match raw.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => return Ok(None),
    };

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(timestamp.with_timezone(&Utc)));
    }

    let invalid = || ValidationError::InvalidDate {
        field,
        value: value.to_string(),
    };
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())?;
    let naive: Option<NaiveDateTime> = match bound {
        Bound::Start => date.and_hms_opt(0, 0, 0),
        Bound::End => date.and_hms_micro_opt(23, 59, 59, 999_999),
    };
    naive
        .map(|n| Some(Utc.from_utc_datetime(&n)))
        .ok_or_else(invalid)
}
