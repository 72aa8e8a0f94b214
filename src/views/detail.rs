use tracing::{debug, instrument, warn};

use super::{FavoriteToggle, Notice};
use crate::ingredients::{self, IngredientLine};
use crate::mealdb::RecipeSource;
use crate::model::Recipe;
use crate::store::{FavoriteStore, Identity};

pub const LOAD_FAILED: &str = "Failed to load recipe";

#[derive(Debug)]
pub struct RecipeDetail {
    pub recipe: Recipe,
    pub ingredients: Vec<IngredientLine>,
    pub favorite: FavoriteToggle,
}

impl RecipeDetail {
    pub fn new(recipe: Recipe, favorited: bool) -> Self {
        let ingredients = ingredients::derive(&recipe);
        let favorite = FavoriteToggle::new(recipe.to_ref(), favorited);
        Self {
            recipe,
            ingredients,
            favorite,
        }
    }

    pub fn steps(&self) -> Vec<&str> {
        self.recipe.instruction_steps()
    }
}

#[derive(Debug)]
pub enum DetailState {
    /// Before the first `load` completes.
    Loading,
    Ready(RecipeDetail),
    NotFound,
    Failed(String),
}

#[derive(Debug)]
pub struct DetailView {
    state: DetailState,
}

impl Default for DetailView {
    fn default() -> Self {
        Self::new()
    }
}

impl DetailView {
    pub fn new() -> Self {
        Self {
            state: DetailState::Loading,
        }
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    /// Fetch the recipe and, for a signed-in user, its favorite status, concurrently.
    #[instrument(skip_all, fields(recipe_id = %id))]
    pub async fn load(
        &mut self,
        source: &dyn RecipeSource,
        store: &dyn FavoriteStore,
        identity: Option<&Identity>,
        id: &str,
    ) {
        let (recipe, favorited) =
            futures::join!(source.lookup(id), favorite_status(store, identity, id));
        self.state = match recipe {
            Ok(Some(recipe)) => DetailState::Ready(RecipeDetail::new(recipe, favorited)),
            Ok(None) => DetailState::NotFound,
            Err(err) => {
                warn!(?err, "error fetching recipe");
                DetailState::Failed(LOAD_FAILED.into())
            }
        };
    }

    /// Toggle the loaded recipe's favorite flag. Does nothing useful before a
    /// successful load; callers hide the control in that case.
    pub async fn toggle_favorite(
        &self,
        store: &dyn FavoriteStore,
        identity: Option<&Identity>,
    ) -> Option<Result<bool, Notice>> {
        match &self.state {
            DetailState::Ready(detail) => Some(detail.favorite.toggle(store, identity).await),
            _ => None,
        }
    }
}

/// Whether `identity` has favorited `recipe_id`. Lookup failures count as "no".
pub async fn favorite_status(
    store: &dyn FavoriteStore,
    identity: Option<&Identity>,
    recipe_id: &str,
) -> bool {
    let Some(identity) = identity else {
        return false;
    };
    match store.find(identity, recipe_id).await {
        Ok(entry) => entry.is_some(),
        Err(err) => {
            debug!(?err, recipe_id, "favorite status lookup failed");
            false
        }
    }
}
