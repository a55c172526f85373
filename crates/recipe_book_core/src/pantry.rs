//! crates/recipe_book_core/src/pantry.rs
//!
//! Rules for changing a person's pantry. Quantities only ever go up through
//! these flows; every increase is recorded as a purchase.

use std::collections::HashMap;

use crate::domain::{PantryAddition, QuantityUpdate};
use crate::validation::{validate_quantity, ValidationError};

/// A storage-level change produced by planning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PantryChange {
    /// The ingredient is new to the pantry; `quantity` is also the purchase.
    Insert { ingredient_id: i32, quantity: f64 },
    /// The stored quantity grows to `quantity`; `purchased` is the difference.
    Increase {
        ingredient_id: i32,
        quantity: f64,
        purchased: f64,
    },
}

impl PantryChange {
    pub fn ingredient_id(&self) -> i32 {
        match self {
            PantryChange::Insert { ingredient_id, .. }
            | PantryChange::Increase { ingredient_id, .. } => *ingredient_id,
        }
    }

    /// The amount to record in purchase history.
    pub fn purchased(&self) -> f64 {
        match self {
            PantryChange::Insert { quantity, .. } => *quantity,
            PantryChange::Increase { purchased, .. } => *purchased,
        }
    }
}

/// Keeps only the additions for ingredients not already owned. The first
/// mention of a repeated ingredient wins.
pub fn plan_additions(
    current: &HashMap<i32, f64>,
    additions: &[PantryAddition],
) -> Result<Vec<PantryChange>, ValidationError> {
    let mut planned: Vec<PantryChange> = Vec::new();
    for addition in additions {
        let quantity = validate_quantity(addition.ingredient_id, addition.quantity)?;
        let already_planned = planned
            .iter()
            .any(|c| c.ingredient_id() == addition.ingredient_id);
        if current.contains_key(&addition.ingredient_id) || already_planned {
            continue;
        }
        planned.push(PantryChange::Insert {
            ingredient_id: addition.ingredient_id,
            quantity,
        });
    }
    Ok(planned)
}

/// Turns requested absolute quantities into changes. A request below the
/// stored quantity rejects the whole batch; an unchanged quantity is skipped.
/// When an ingredient is listed more than once, the last request counts.
pub fn plan_quantity_updates(
    current: &HashMap<i32, f64>,
    updates: &[QuantityUpdate],
) -> Result<Vec<PantryChange>, ValidationError> {
    let mut order: Vec<i32> = Vec::new();
    let mut requested: HashMap<i32, f64> = HashMap::new();
    for update in updates {
        let quantity = validate_quantity(update.ingredient_id, update.quantity)?;
        if requested.insert(update.ingredient_id, quantity).is_none() {
            order.push(update.ingredient_id);
        }
    }

    let mut changes = Vec::new();
    for ingredient_id in order {
        let quantity = requested[&ingredient_id];
        match current.get(&ingredient_id) {
            None => changes.push(PantryChange::Insert {
                ingredient_id,
                quantity,
            }),
            Some(&owned) if quantity < owned => {
                return Err(ValidationError::QuantityDecrease {
                    ingredient_id,
                    current: owned,
                    requested: quantity,
                })
            }
            Some(&owned) if quantity > owned => changes.push(PantryChange::Increase {
                ingredient_id,
                quantity,
                purchased: quantity - owned,
            }),
            Some(_) => {}
        }
    }
    Ok(changes)
}
