use chrono::Utc;
use serde_json::Value;
use tracing::info;

use super::model::{Credentials, SessionResponse};
use super::{Identity, SupabaseClient};
use crate::error::StoreError;

impl SupabaseClient {
    fn auth_request(
        &self,
        path: &str,
        credentials: &Credentials<'_>,
    ) -> Result<reqwest::Request, StoreError> {
        let url = self.endpoint(path)?;
        self.http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(credentials)
            .build()
            .map_err(StoreError::Transport)
    }

    pub fn build_sign_in_request(
        &self,
        email: &str,
        password: &str,
    ) -> Result<reqwest::Request, StoreError> {
        self.auth_request(
            "auth/v1/token?grant_type=password",
            &Credentials { email, password },
        )
    }

    pub fn build_sign_up_request(
        &self,
        email: &str,
        password: &str,
    ) -> Result<reqwest::Request, StoreError> {
        self.auth_request("auth/v1/signup", &Credentials { email, password })
    }

    pub fn build_sign_out_request(
        &self,
        identity: &Identity,
    ) -> Result<reqwest::Request, StoreError> {
        let url = self.endpoint("auth/v1/logout")?;
        self.http
            .post(url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", identity.access_token))
            .build()
            .map_err(StoreError::Transport)
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, StoreError> {
        let request = self.build_sign_in_request(email, password)?;
        let res = self.execute(request).await?;
        let session: SessionResponse = res.json().await.map_err(StoreError::Decode)?;
        let identity = session.into_identity(Utc::now());
        info!(user_id=%identity.user_id, "signed in");
        Ok(identity)
    }

    /// Register a new account. `None` means the project requires email
    /// confirmation before a session is issued.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Identity>, StoreError> {
        let request = self.build_sign_up_request(email, password)?;
        let res = self.execute(request).await?;
        let body: Value = res.json().await.map_err(StoreError::Decode)?;
        if body.get("access_token").is_none() {
            info!(email, "signed up; confirmation pending");
            return Ok(None);
        }
        let session: SessionResponse =
            serde_json::from_value(body).map_err(|e| StoreError::Rejected {
                status: reqwest::StatusCode::OK,
                message: format!("unexpected signup response: {}", e),
            })?;
        let identity = session.into_identity(Utc::now());
        info!(user_id=%identity.user_id, "signed up");
        Ok(Some(identity))
    }

    pub async fn sign_out(&self, identity: &Identity) -> Result<(), StoreError> {
        let request = self.build_sign_out_request(identity)?;
        self.execute(request).await?;
        info!(user_id=%identity.user_id, "signed out");
        Ok(())
    }
}
