use async_trait::async_trait;
use reqwest::{Client, Url};
use std::fmt;
use tracing::{debug, warn};

use crate::config::with_trailing_slash;
use crate::error::SourceError;
use crate::mealdb::model::MealsEnvelope;
use crate::model::Recipe;

pub mod model;

const MEALDB_API_BASE: &str = crate::config::DEFAULT_MEALDB_BASE;

/// Read-only recipe catalogue: search by name and lookup by id.
#[async_trait]
pub trait RecipeSource: Send + Sync {
    /// Recipes whose name matches `term`. No matches is `Ok(vec![])`.
    async fn search(&self, term: &str) -> Result<Vec<Recipe>, SourceError>;

    /// The recipe with `id`, or `None` when the source has no such meal.
    async fn lookup(&self, id: &str) -> Result<Option<Recipe>, SourceError>;
}

#[derive(Clone)]
pub struct MealDbClient {
    http: Client,
    base_url: Url,
}

impl fmt::Debug for MealDbClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MealDbClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl MealDbClient {
    pub fn new() -> Self {
        let base_url = Url::parse(MEALDB_API_BASE).expect("valid default MealDB URL");
        Self::with_base_url(base_url)
    }

    pub fn with_base_url(base_url: Url) -> Self {
        let http = Client::builder()
            .user_agent("recipe-finder/0.1")
            .no_proxy()
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url: with_trailing_slash(base_url),
        }
    }

    pub fn from_config(cfg: &crate::config::Config) -> Result<Self, SourceError> {
        let base_url = Url::parse(cfg.mealdb.base_url.trim())
            .map_err(|e| SourceError::InvalidUrl(e.to_string()))?;
        Ok(Self::with_base_url(base_url))
    }

    pub fn build_search_request(&self, term: &str) -> Result<reqwest::Request, SourceError> {
        self.build_get("search.php", "s", term)
    }

    pub fn build_lookup_request(&self, id: &str) -> Result<reqwest::Request, SourceError> {
        self.build_get("lookup.php", "i", id)
    }

    fn build_get(&self, path: &str, key: &str, value: &str) -> Result<reqwest::Request, SourceError> {
        let mut endpoint = self
            .base_url
            .join(path)
            .map_err(|e| SourceError::InvalidUrl(e.to_string()))?;
        endpoint.query_pairs_mut().append_pair(key, value);
        self.http
            .get(endpoint)
            .header("Accept", "application/json")
            .build()
            .map_err(SourceError::Transport)
    }

    async fn execute(&self, request: reqwest::Request) -> Result<Vec<Recipe>, SourceError> {
        debug!(url=%request.url(), "sending recipe source request");
        let res = self
            .http
            .execute(request)
            .await
            .map_err(SourceError::Transport)?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            warn!(%status, "recipe source error");
            return Err(SourceError::Status { status, body });
        }

        let envelope: MealsEnvelope = res.json().await.map_err(SourceError::Decode)?;
        let recipes = envelope.into_recipes();
        debug!(count = recipes.len(), "recipe source response");
        Ok(recipes)
    }
}

impl Default for MealDbClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecipeSource for MealDbClient {
    async fn search(&self, term: &str) -> Result<Vec<Recipe>, SourceError> {
        let request = self.build_search_request(term)?;
        self.execute(request).await
    }

    async fn lookup(&self, id: &str) -> Result<Option<Recipe>, SourceError> {
        let request = self.build_lookup_request(id)?;
        Ok(self.execute(request).await?.into_iter().next())
    }
}
