//! Favorites backend: a PostgREST table plus GoTrue auth on one hosted project.
use async_trait::async_trait;
use reqwest::{Client, Method, Response, Url};
use std::fmt;
use tracing::{debug, warn};

use crate::config::{with_trailing_slash, Config};
use crate::error::StoreError;
use crate::model::{FavoriteEntry, NewFavorite};

pub mod auth;
pub mod model;

pub use model::Identity;

/// Row-per-(user, recipe) favorites table. Every call is scoped to `identity`.
#[async_trait]
pub trait FavoriteStore: Send + Sync {
    /// All of the user's favorites, newest first.
    async fn list(&self, identity: &Identity) -> Result<Vec<FavoriteEntry>, StoreError>;

    /// The user's entry for `recipe_id`, if any.
    async fn find(
        &self,
        identity: &Identity,
        recipe_id: &str,
    ) -> Result<Option<FavoriteEntry>, StoreError>;

    async fn insert(
        &self,
        identity: &Identity,
        favorite: &NewFavorite,
    ) -> Result<FavoriteEntry, StoreError>;

    async fn remove(&self, identity: &Identity, recipe_id: &str) -> Result<(), StoreError>;
}

/// Stand-in used when no store is configured; every call fails the same way.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

#[async_trait]
impl FavoriteStore for Unconfigured {
    async fn list(&self, _identity: &Identity) -> Result<Vec<FavoriteEntry>, StoreError> {
        Err(StoreError::NotConfigured)
    }

    async fn find(
        &self,
        _identity: &Identity,
        _recipe_id: &str,
    ) -> Result<Option<FavoriteEntry>, StoreError> {
        Err(StoreError::NotConfigured)
    }

    async fn insert(
        &self,
        _identity: &Identity,
        _favorite: &NewFavorite,
    ) -> Result<FavoriteEntry, StoreError> {
        Err(StoreError::NotConfigured)
    }

    async fn remove(&self, _identity: &Identity, _recipe_id: &str) -> Result<(), StoreError> {
        Err(StoreError::NotConfigured)
    }
}

#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    base_url: Url,
    anon_key: String,
    table: String,
}

impl fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    pub fn new(base_url: Url, anon_key: String, table: String) -> Self {
        let http = Client::builder()
            .user_agent("recipe-finder/0.1")
            .no_proxy()
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url: with_trailing_slash(base_url),
            anon_key,
            table,
        }
    }

    /// Build a client from the `store` section, or `NotConfigured` when it is
    /// absent or still holds placeholder values.
    pub fn from_config(cfg: &Config) -> Result<Self, StoreError> {
        let store = cfg.store_settings().ok_or(StoreError::NotConfigured)?;
        let base_url =
            Url::parse(store.url.trim()).map_err(|e| StoreError::InvalidUrl(e.to_string()))?;
        Ok(Self::new(
            base_url,
            store.anon_key.trim().to_string(),
            store.favorites_table.trim().to_string(),
        ))
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.base_url
            .join(path)
            .map_err(|e| StoreError::InvalidUrl(e.to_string()))
    }

    fn table_url(&self, filters: &[(&str, String)]) -> Result<Url, StoreError> {
        let mut url = self.endpoint(&format!("rest/v1/{}", self.table))?;
        if !filters.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in filters {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn table_request(
        &self,
        method: Method,
        identity: &Identity,
        filters: &[(&str, String)],
    ) -> Result<reqwest::RequestBuilder, StoreError> {
        let url = self.table_url(filters)?;
        Ok(self
            .http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", identity.access_token)))
    }

    pub fn build_list_request(&self, identity: &Identity) -> Result<reqwest::Request, StoreError> {
        self.table_request(
            Method::GET,
            identity,
            &[
                ("select", "*".into()),
                ("user_id", eq(identity.user_id)),
                ("order", "created_at.desc".into()),
            ],
        )?
        .build()
        .map_err(StoreError::Transport)
    }

    pub fn build_find_request(
        &self,
        identity: &Identity,
        recipe_id: &str,
    ) -> Result<reqwest::Request, StoreError> {
        self.table_request(
            Method::GET,
            identity,
            &[
                ("select", "*".into()),
                ("user_id", eq(identity.user_id)),
                ("recipe_id", eq(recipe_id)),
                ("limit", "1".into()),
            ],
        )?
        .build()
        .map_err(StoreError::Transport)
    }

    pub fn build_insert_request(
        &self,
        identity: &Identity,
        favorite: &NewFavorite,
    ) -> Result<reqwest::Request, StoreError> {
        self.table_request(Method::POST, identity, &[])?
            .header("Prefer", "return=representation")
            .json(favorite)
            .build()
            .map_err(StoreError::Transport)
    }

    pub fn build_delete_request(
        &self,
        identity: &Identity,
        recipe_id: &str,
    ) -> Result<reqwest::Request, StoreError> {
        self.table_request(
            Method::DELETE,
            identity,
            &[
                ("user_id", eq(identity.user_id)),
                ("recipe_id", eq(recipe_id)),
            ],
        )?
        .build()
        .map_err(StoreError::Transport)
    }

    async fn execute(&self, request: reqwest::Request) -> Result<Response, StoreError> {
        debug!(method=%request.method(), url=%request.url(), "sending store request");
        let res = self
            .http
            .execute(request)
            .await
            .map_err(StoreError::Transport)?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            warn!(%status, body=%body, "store rejected request");
            return Err(StoreError::Rejected {
                status,
                message: model::error_message(&body),
            });
        }
        Ok(res)
    }

    async fn fetch_rows(&self, request: reqwest::Request) -> Result<Vec<FavoriteEntry>, StoreError> {
        let res = self.execute(request).await?;
        res.json().await.map_err(StoreError::Decode)
    }
}

fn eq(value: impl fmt::Display) -> String {
    format!("eq.{}", value)
}

#[async_trait]
impl FavoriteStore for SupabaseClient {
    async fn list(&self, identity: &Identity) -> Result<Vec<FavoriteEntry>, StoreError> {
        let request = self.build_list_request(identity)?;
        self.fetch_rows(request).await
    }

    async fn find(
        &self,
        identity: &Identity,
        recipe_id: &str,
    ) -> Result<Option<FavoriteEntry>, StoreError> {
        let request = self.build_find_request(identity, recipe_id)?;
        Ok(self.fetch_rows(request).await?.into_iter().next())
    }

    async fn insert(
        &self,
        identity: &Identity,
        favorite: &NewFavorite,
    ) -> Result<FavoriteEntry, StoreError> {
        let request = self.build_insert_request(identity, favorite)?;
        self.fetch_rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Rejected {
                status: reqwest::StatusCode::OK,
                message: "insert returned no row".into(),
            })
    }

    async fn remove(&self, identity: &Identity, recipe_id: &str) -> Result<(), StoreError> {
        let request = self.build_delete_request(identity, recipe_id)?;
        self.execute(request).await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use uuid::Uuid;

    pub(crate) fn sample_client() -> SupabaseClient {
        SupabaseClient::new(
            Url::parse("https://abc.supabase.co").unwrap(),
            "anon-key".into(),
            "favorites".into(),
        )
    }

    pub(crate) fn sample_identity() -> Identity {
        Identity {
            user_id: Uuid::parse_str("6f1c2c3e-8f0a-4b5e-9c1d-2a3b4c5d6e7f").unwrap(),
            email: Some("cook@example.com".into()),
            access_token: "user-jwt".into(),
            refresh_token: None,
            expires_at: None,
        }
    }

    fn header<'a>(request: &'a reqwest::Request, name: &str) -> &'a str {
        request
            .headers()
            .get(name)
            .and_then(|h| h.to_str().ok())
            .unwrap()
    }

    fn query(request: &reqwest::Request) -> Vec<(String, String)> {
        request.url().query_pairs().into_owned().collect()
    }

    #[test]
    fn list_request_filters_and_orders() {
        let client = sample_client();
        let identity = sample_identity();
        let request = client.build_list_request(&identity).unwrap();
        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.url().path(), "/rest/v1/favorites");
        assert_eq!(
            query(&request),
            vec![
                ("select".to_string(), "*".to_string()),
                ("user_id".to_string(), format!("eq.{}", identity.user_id)),
                ("order".to_string(), "created_at.desc".to_string()),
            ]
        );
        assert_eq!(header(&request, "apikey"), "anon-key");
        assert_eq!(header(&request, "Authorization"), "Bearer user-jwt");
    }

    #[test]
    fn base_url_path_is_kept() {
        let client = SupabaseClient::new(
            Url::parse("https://host.example/supabase").unwrap(),
            "anon-key".into(),
            "favorites".into(),
        );
        let request = client.build_list_request(&sample_identity()).unwrap();
        assert_eq!(request.url().path(), "/supabase/rest/v1/favorites");
        let request = client.build_sign_in_request("cook@example.com", "secret").unwrap();
        assert_eq!(request.url().path(), "/supabase/auth/v1/token");
    }

    #[test]
    fn find_request_filters_by_user_and_recipe() {
        let client = sample_client();
        let identity = sample_identity();
        let request = client.build_find_request(&identity, "52772").unwrap();
        let q = query(&request);
        assert!(q.contains(&("recipe_id".to_string(), "eq.52772".to_string())));
        assert!(q.contains(&("user_id".to_string(), format!("eq.{}", identity.user_id))));
        assert!(q.contains(&("limit".to_string(), "1".to_string())));
    }

    #[test]
    fn insert_request_sends_payload() {
        let client = sample_client();
        let identity = sample_identity();
        let favorite = NewFavorite {
            user_id: identity.user_id,
            recipe_id: "52772".into(),
            recipe_name: "Teriyaki Chicken Casserole".into(),
            recipe_image: None,
        };
        let request = client.build_insert_request(&identity, &favorite).unwrap();
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.url().query(), None);
        assert_eq!(header(&request, "Prefer"), "return=representation");
        assert_eq!(header(&request, "Content-Type"), "application/json");
        let body: serde_json::Value =
            serde_json::from_slice(request.body().and_then(|b| b.as_bytes()).unwrap()).unwrap();
        assert_eq!(body["recipe_id"], "52772");
        assert_eq!(body["user_id"], identity.user_id.to_string());
    }

    #[test]
    fn delete_request_filters_by_user_and_recipe() {
        let client = sample_client();
        let identity = sample_identity();
        let request = client.build_delete_request(&identity, "52772").unwrap();
        assert_eq!(request.method(), Method::DELETE);
        assert_eq!(
            query(&request),
            vec![
                ("user_id".to_string(), format!("eq.{}", identity.user_id)),
                ("recipe_id".to_string(), "eq.52772".to_string()),
            ]
        );
    }

    #[test]
    fn from_config_requires_configured_store() {
        let cfg: Config = serde_yaml::from_str(crate::config::example()).unwrap();
        assert!(matches!(
            SupabaseClient::from_config(&cfg),
            Err(StoreError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn unconfigured_fails_uniformly() {
        let identity = sample_identity();
        let store = Unconfigured;
        assert!(matches!(store.list(&identity).await, Err(StoreError::NotConfigured)));
        assert!(matches!(store.find(&identity, "1").await, Err(StoreError::NotConfigured)));
        assert!(matches!(store.remove(&identity, "1").await, Err(StoreError::NotConfigured)));
    }
}
