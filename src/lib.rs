//! Recipe search with per-user favorites.
//!
//! - `mealdb`: TheMealDB search/lookup client behind [`mealdb::RecipeSource`].
//! - `store`: hosted favorites table and auth behind [`store::FavoriteStore`].
//! - `views`: screen state that ties the two together.

pub mod config;
pub mod error;
pub mod ingredients;
pub mod mealdb;
pub mod model;
pub mod session;
pub mod store;
pub mod views;
