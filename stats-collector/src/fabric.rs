//! Equinix Fabric API client.
//!
//! Covers the three calls a collection run needs: token exchange, connection
//! search and per-connection bandwidth stats.

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;

use common::errors::{AppError, AppResult};
use common::models::{
    BandwidthStats, ConnectionRecord, ConnectionSearchRequest, ConnectionSearchResponse,
    StatsResponse, StatsWindow,
};

/// Bearer token valid for one collection run.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Provider operations used by the pipeline.
#[async_trait]
pub trait FabricApi: Send + Sync {
    /// Exchanges client credentials for a bearer token.
    async fn authenticate(&self, client_id: &str, client_secret: &str) -> AppResult<AccessToken>;

    /// Lists OUTGOING and INTERNAL connections (first page only).
    async fn list_connections(&self, token: &AccessToken) -> AppResult<Vec<ConnectionRecord>>;

    /// Fetches a-side bandwidth utilization of one connection over `window`.
    async fn fetch_stats(
        &self,
        token: &AccessToken,
        connection_id: &str,
        window: &StatsWindow,
    ) -> AppResult<BandwidthStats>;
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// HTTP implementation of [`FabricApi`].
pub struct FabricClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl FabricClient {
    /// Creates a client for the API rooted at `base_url`.
    pub fn new(base_url: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            http_client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl FabricApi for FabricClient {
    async fn authenticate(&self, client_id: &str, client_secret: &str) -> AppResult<AccessToken> {
        if client_id.is_empty() || client_secret.is_empty() {
            return Err(AppError::Config("client_id or client_secret is not set".into()));
        }

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ];
        let response = self
            .http_client
            .post(self.url("/oauth2/v1/token"))
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Auth(format!("token endpoint returned HTTP {}", status)));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("invalid token response: {}", e)))?;

        body.access_token
            .filter(|t| !t.is_empty())
            .map(AccessToken::new)
            .ok_or_else(|| AppError::Auth("token response has no access_token".into()))
    }

    async fn list_connections(&self, token: &AccessToken) -> AppResult<Vec<ConnectionRecord>> {
        let response = self
            .http_client
            .post(self.url("/fabric/v4/connections/search"))
            .bearer_auth(token.as_str())
            .json(&ConnectionSearchRequest::outgoing_and_internal())
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("connection search failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Auth(format!(
                "connection search returned HTTP {}",
                status
            )));
        }

        let body: ConnectionSearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("invalid connection search response: {}", e)))?;

        if body.data.is_empty() {
            return Err(AppError::EmptyResult("connection search returned no connections".into()));
        }

        tracing::debug!(count = body.data.len(), "Connections enumerated");
        Ok(body.data)
    }

    async fn fetch_stats(
        &self,
        token: &AccessToken,
        connection_id: &str,
        window: &StatsWindow,
    ) -> AppResult<BandwidthStats> {
        let url = self.url(&format!("/fabric/v4/connections/{}/stats", connection_id));
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(token.as_str())
            .query(&[
                ("startDateTime", window.start_param()),
                ("endDateTime", window.end_param()),
                ("viewPoint", "aSide".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Http(format!("stats request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Http(format!("stats endpoint returned HTTP {}", status)));
        }

        let body: StatsResponse = response
            .json()
            .await
            .map_err(|e| AppError::Http(format!("invalid stats response: {}", e)))?;

        Ok(BandwidthStats::from(body))
    }
}
