use tracing::{instrument, warn};

use super::Notice;
use crate::model::FavoriteEntry;
use crate::store::{FavoriteStore, Identity};

pub const LOAD_FAILED: &str = "Failed to load favorites";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoritesState {
    SignedOut,
    /// Before the first `load` completes.
    Loading,
    Empty,
    Loaded(Vec<FavoriteEntry>),
    Failed(String),
}

#[derive(Debug)]
pub struct FavoritesView {
    state: FavoritesState,
}

impl Default for FavoritesView {
    fn default() -> Self {
        Self::new()
    }
}

impl FavoritesView {
    pub fn new() -> Self {
        Self {
            state: FavoritesState::Loading,
        }
    }

    pub fn state(&self) -> &FavoritesState {
        &self.state
    }

    pub fn entries(&self) -> &[FavoriteEntry] {
        match &self.state {
            FavoritesState::Loaded(entries) => entries.as_slice(),
            _ => &[],
        }
    }

    #[instrument(skip_all)]
    pub async fn load(&mut self, store: &dyn FavoriteStore, identity: Option<&Identity>) {
        let Some(identity) = identity else {
            self.state = FavoritesState::SignedOut;
            return;
        };
        self.state = match store.list(identity).await {
            Ok(entries) if entries.is_empty() => FavoritesState::Empty,
            Ok(entries) => FavoritesState::Loaded(entries),
            Err(err) => {
                warn!(?err, "error fetching favorites");
                FavoritesState::Failed(LOAD_FAILED.into())
            }
        };
    }

    /// Delete the favorite in the store, then drop it from the local list.
    /// The list is never re-fetched.
    #[instrument(skip_all, fields(recipe_id = %recipe_id))]
    pub async fn remove(
        &mut self,
        store: &dyn FavoriteStore,
        identity: Option<&Identity>,
        recipe_id: &str,
    ) -> Result<(), Notice> {
        let identity = identity.ok_or(Notice::LoginRequired)?;
        store.remove(identity, recipe_id).await.map_err(|err| {
            warn!(?err, "error removing favorite");
            Notice::RemoveFailed
        })?;
        if let FavoritesState::Loaded(entries) = &mut self.state {
            entries.retain(|fav| fav.recipe_id != recipe_id);
            if entries.is_empty() {
                self.state = FavoritesState::Empty;
            }
        }
        Ok(())
    }

    /// Header line shown above the list.
    pub fn summary(&self) -> String {
        match self.entries().len() {
            0 => "You haven't saved any favorite recipes yet.".to_string(),
            1 => "You have 1 favorite recipe.".to_string(),
            n => format!("You have {} favorite recipes.", n),
        }
    }
}
