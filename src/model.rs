use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of ingredient/measure slots a recipe record carries.
pub const INGREDIENT_SLOTS: usize = 20;

static YOUTUBE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:[?&]v=|youtu\.be/)([A-Za-z0-9_-]+)").expect("valid regex"));

/// A recipe as returned by the recipe source. Read-only; lives in view state only.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub thumbnail_url: Option<String>,
    pub category: Option<String>,
    pub area: Option<String>,
    pub instructions: String,
    pub tags: Vec<String>,
    pub ingredients: [Option<String>; INGREDIENT_SLOTS],
    pub measures: [Option<String>; INGREDIENT_SLOTS],
    pub source_url: Option<String>,
    pub video_url: Option<String>,
}

impl Recipe {
    /// Instruction text split on newlines, trimmed, blank lines dropped.
    pub fn instruction_steps(&self) -> Vec<&str> {
        self.instructions
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }

    /// YouTube video id extracted from `video_url`, if it has one.
    pub fn video_id(&self) -> Option<&str> {
        let url = self.video_url.as_deref()?;
        YOUTUBE_ID
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    pub fn to_ref(&self) -> RecipeRef {
        RecipeRef {
            id: self.id.clone(),
            name: self.name.clone(),
            thumbnail_url: self.thumbnail_url.clone(),
        }
    }
}

/// The slice of a recipe needed to save it as a favorite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeRef {
    pub id: String,
    pub name: String,
    pub thumbnail_url: Option<String>,
}

/// One row of the favorites table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FavoriteEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recipe_id: String,
    pub recipe_name: String,
    pub recipe_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for the favorites table; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewFavorite {
    pub user_id: Uuid,
    pub recipe_id: String,
    pub recipe_name: String,
    pub recipe_image: Option<String>,
}

impl NewFavorite {
    pub fn new(user_id: Uuid, recipe: &RecipeRef) -> Self {
        Self {
            user_id,
            recipe_id: recipe.id.clone(),
            recipe_name: recipe.name.clone(),
            recipe_image: recipe.thumbnail_url.clone(),
        }
    }
}
