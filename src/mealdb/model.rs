use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::model::{Recipe, INGREDIENT_SLOTS};

/// `{ "meals": [...] | null }` envelope shared by search and lookup.
#[derive(Deserialize, Debug)]
pub struct MealsEnvelope {
    pub meals: Option<Vec<MealRecord>>,
}

impl MealsEnvelope {
    pub fn into_recipes(self) -> Vec<Recipe> {
        self.meals
            .unwrap_or_default()
            .into_iter()
            .map(Recipe::from)
            .collect()
    }
}

/// One meal as the API spells it. Ingredient/measure slots land in `slots`.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MealRecord {
    pub id_meal: String,
    pub str_meal: String,
    pub str_meal_thumb: Option<String>,
    pub str_category: Option<String>,
    pub str_area: Option<String>,
    pub str_instructions: Option<String>,
    pub str_tags: Option<String>,
    pub str_youtube: Option<String>,
    pub str_source: Option<String>,
    #[serde(flatten)]
    pub slots: HashMap<String, Value>,
}

impl MealRecord {
    fn slot(&self, prefix: &str, index: usize) -> Option<String> {
        self.slots
            .get(&format!("{}{}", prefix, index))
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<MealRecord> for Recipe {
    fn from(record: MealRecord) -> Self {
        let mut ingredients: [Option<String>; INGREDIENT_SLOTS] = Default::default();
        let mut measures: [Option<String>; INGREDIENT_SLOTS] = Default::default();
        for i in 0..INGREDIENT_SLOTS {
            ingredients[i] = record.slot("strIngredient", i + 1);
            measures[i] = record.slot("strMeasure", i + 1);
        }

        let tags = record
            .str_tags
            .as_deref()
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Recipe {
            id: record.id_meal,
            name: record.str_meal,
            thumbnail_url: non_blank(record.str_meal_thumb),
            category: non_blank(record.str_category),
            area: non_blank(record.str_area),
            instructions: record.str_instructions.unwrap_or_default(),
            tags,
            ingredients,
            measures,
            source_url: non_blank(record.str_source),
            video_url: non_blank(record.str_youtube),
        }
    }
}
