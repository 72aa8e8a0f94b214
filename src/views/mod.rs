//! View state for the three screens: search, recipe detail and favorites.
//!
//! Every operation here catches its own service errors and maps them to a
//! state or a [`Notice`]. Nothing is retried.

use thiserror::Error;

pub mod detail;
pub mod favorites;
pub mod search;
pub mod toggle;

pub use detail::{DetailState, DetailView, RecipeDetail};
pub use favorites::{FavoritesState, FavoritesView};
pub use search::{RecipeCard, SearchState, SearchView};
pub use toggle::FavoriteToggle;

/// User-visible outcome of a favorite action that did not go through.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum Notice {
    #[error("Please log in to save favorites")]
    LoginRequired,
    #[error("A favorite update is already in progress")]
    Busy,
    #[error("Error saving favorite. Please try again.")]
    SaveFailed,
    #[error("Error removing favorite. Please try again.")]
    RemoveFailed,
}
