//! Ingredient list derivation from a recipe's fixed ingredient/measure slots.
use serde::Serialize;

use crate::model::{Recipe, INGREDIENT_SLOTS};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IngredientLine {
    pub ingredient: String,
    pub measure: String,
}

/// Walk slots 1..=20 in order and keep the ones with a non-blank ingredient name,
/// paired with the trimmed measure of the same slot (empty when absent).
pub fn derive(recipe: &Recipe) -> Vec<IngredientLine> {
    recipe
        .ingredients
        .iter()
        .zip(recipe.measures.iter())
        .take(INGREDIENT_SLOTS)
        .filter_map(|(ingredient, measure)| {
            let ingredient = ingredient.as_deref().filter(|s| !s.trim().is_empty())?;
            Some(IngredientLine {
                ingredient: ingredient.to_string(),
                measure: measure.as_deref().map(str::trim).unwrap_or_default().to_string(),
            })
        })
        .collect()
}
