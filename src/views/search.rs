use tracing::{instrument, warn};

use super::FavoriteToggle;
use crate::mealdb::RecipeSource;
use crate::model::Recipe;

pub const SEARCH_FAILED: &str = "Failed to fetch recipes. Please try again.";

/// A search result with its own favorite control. Cards do not look up the
/// stored status, so they always start unfavorited.
#[derive(Debug)]
pub struct RecipeCard {
    pub recipe: Recipe,
    pub favorite: FavoriteToggle,
}

impl RecipeCard {
    pub fn new(recipe: Recipe) -> Self {
        let favorite = FavoriteToggle::new(recipe.to_ref(), false);
        Self { recipe, favorite }
    }
}

#[derive(Debug)]
pub enum SearchState {
    Idle,
    Results(Vec<RecipeCard>),
    NoResults { term: String },
    Failed(String),
}

#[derive(Debug)]
pub struct SearchView {
    state: SearchState,
}

impl Default for SearchView {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchView {
    pub fn new() -> Self {
        Self {
            state: SearchState::Idle,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn cards(&self) -> &[RecipeCard] {
        match &self.state {
            SearchState::Results(cards) => cards.as_slice(),
            _ => &[],
        }
    }

    /// Run a search. Blank input is ignored: no request, state untouched.
    /// Returns whether a request was issued.
    #[instrument(skip_all, fields(term = %input))]
    pub async fn submit(&mut self, source: &dyn RecipeSource, input: &str) -> bool {
        let term = input.trim();
        if term.is_empty() {
            return false;
        }

        self.state = match source.search(term).await {
            Ok(recipes) if recipes.is_empty() => SearchState::NoResults {
                term: term.to_string(),
            },
            Ok(recipes) => SearchState::Results(recipes.into_iter().map(RecipeCard::new).collect()),
            Err(err) => {
                warn!(?err, "error fetching recipes");
                SearchState::Failed(SEARCH_FAILED.into())
            }
        };
        true
    }
}
