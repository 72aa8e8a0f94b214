use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{instrument, warn};

use super::Notice;
use crate::model::{NewFavorite, RecipeRef};
use crate::store::{FavoriteStore, Identity};

/// Favorite flag for one recipe, with a busy flag that refuses overlapping toggles.
///
/// Last write wins: there is no version check against the store, so two racing
/// toggles from separate instances can leave the store out of step with the flag.
#[derive(Debug)]
pub struct FavoriteToggle {
    recipe: RecipeRef,
    favorited: AtomicBool,
    busy: AtomicBool,
}

/// Clears the busy flag when the toggle finishes or its future is dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl FavoriteToggle {
    pub fn new(recipe: RecipeRef, favorited: bool) -> Self {
        Self {
            recipe,
            favorited: AtomicBool::new(favorited),
            busy: AtomicBool::new(false),
        }
    }

    pub fn recipe(&self) -> &RecipeRef {
        &self.recipe
    }

    pub fn is_favorited(&self) -> bool {
        self.favorited.load(Ordering::Acquire)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Flip the favorite state in the store and, on success, locally.
    /// Returns the new flag.
    #[instrument(skip_all, fields(recipe_id = %self.recipe.id))]
    pub async fn toggle(
        &self,
        store: &dyn FavoriteStore,
        identity: Option<&Identity>,
    ) -> Result<bool, Notice> {
        let identity = identity.ok_or(Notice::LoginRequired)?;
        let _busy = BusyGuard::acquire(&self.busy).ok_or(Notice::Busy)?;

        if self.is_favorited() {
            store
                .remove(identity, &self.recipe.id)
                .await
                .map_err(|err| {
                    warn!(?err, "failed to remove favorite");
                    Notice::SaveFailed
                })?;
            self.favorited.store(false, Ordering::Release);
        } else {
            let favorite = NewFavorite::new(identity.user_id, &self.recipe);
            store.insert(identity, &favorite).await.map_err(|err| {
                warn!(?err, "failed to save favorite");
                Notice::SaveFailed
            })?;
            self.favorited.store(true, Ordering::Release);
        }
        Ok(self.is_favorited())
    }
}
