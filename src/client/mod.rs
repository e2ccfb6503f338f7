//! Remote repository API client.
//!
//! The repository exposes datasets and collections behind
//! `GET/PUT /{datasets|collections}/{id}`; a `PUT` replaces the full
//! metadata collection atomically (there is no partial-field patch).
//!
//! [`ResourceClient`] is the seam the orchestrator works against, so batch
//! runs can be tested with an in-memory client. [`HttpResourceClient`] is
//! the real reqwest-backed implementation, configured from environment
//! variables (`METACURATE_API_URL`, `METACURATE_API_KEY`).

use serde_json::{json, Value};
use std::env;

use crate::error::{ClientError, ClientResult};
use crate::models::{MetadataEntry, Resolved, ResourceKind, ResourceSnapshot};

/// Remote repository operations used by the batch orchestrator.
#[allow(async_fn_in_trait)]
pub trait ResourceClient {
    /// Resolve a resource kind: probe the dataset endpoint first, then the
    /// collection endpoint on not-found.
    async fn resolve(&self, resource_id: &str) -> ClientResult<Resolved>;

    /// Fetch the complete current metadata of a resource.
    async fn fetch_snapshot(
        &self,
        resource_id: &str,
        kind: ResourceKind,
    ) -> ClientResult<ResourceSnapshot>;

    /// Atomically replace the full metadata collection of a resource.
    async fn replace_metadata(
        &self,
        resource_id: &str,
        kind: ResourceKind,
        metas: &[MetadataEntry],
    ) -> ClientResult<()>;

    /// Create a new dataset carrying the given metadata; returns its id.
    async fn create_dataset(&self, metas: &[MetadataEntry]) -> ClientResult<String>;
}

// =============================================================================
// HTTP implementation
// =============================================================================

/// Reqwest-backed repository client.
#[derive(Clone)]
pub struct HttpResourceClient {
    base_url: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl HttpResourceClient {
    /// Create a client with an explicit base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            http: reqwest::Client::new(),
        }
    }

    /// Create a client from environment variables.
    ///
    /// Loads `.env` if present; `METACURATE_API_URL` is required,
    /// `METACURATE_API_KEY` optional (public read endpoints work without).
    pub fn from_env() -> ClientResult<Self> {
        let _ = dotenvy::dotenv();

        let base_url = env::var("METACURATE_API_URL")
            .map_err(|_| ClientError::MissingConfig("METACURATE_API_URL not set".to_string()))?;

        let mut client = Self::new(base_url);
        client.api_key = env::var("METACURATE_API_KEY").ok();
        Ok(client)
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn url(&self, kind: ResourceKind, resource_id: &str) -> String {
        format!("{}/{}/{}", self.base_url, kind.path_segment(), resource_id)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("X-API-KEY", key),
            None => builder,
        }
    }

    async fn get(&self, url: &str) -> ClientResult<(reqwest::StatusCode, String)> {
        let response = self
            .request(self.http.get(url))
            .send()
            .await
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;
        Ok((status, body))
    }
}

impl ResourceClient for HttpResourceClient {
    async fn resolve(&self, resource_id: &str) -> ClientResult<Resolved> {
        let (status, body) = self.get(&self.url(ResourceKind::Dataset, resource_id)).await?;
        if status.is_success() {
            return Ok(Resolved::Dataset);
        }
        if status != reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::Api { status: status.as_u16(), body });
        }

        let (status, body) = self
            .get(&self.url(ResourceKind::Collection, resource_id))
            .await?;
        if status.is_success() {
            return Ok(Resolved::Collection);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(Resolved::NotFound);
        }
        Err(ClientError::Api { status: status.as_u16(), body })
    }

    async fn fetch_snapshot(
        &self,
        resource_id: &str,
        kind: ResourceKind,
    ) -> ClientResult<ResourceSnapshot> {
        let (status, body) = self.get(&self.url(kind, resource_id)).await?;
        if !status.is_success() {
            return Err(ClientError::Api { status: status.as_u16(), body });
        }

        let mut snapshot: ResourceSnapshot =
            serde_json::from_str(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        snapshot.resource_id = resource_id.to_string();
        snapshot.kind = kind;
        Ok(snapshot)
    }

    async fn replace_metadata(
        &self,
        resource_id: &str,
        kind: ResourceKind,
        metas: &[MetadataEntry],
    ) -> ClientResult<()> {
        let response = self
            .request(self.http.put(&self.url(kind, resource_id)))
            .json(&json!({ "metas": metas }))
            .send()
            .await
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        // Raw body preserved verbatim for operator diagnosis.
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;
        Err(ClientError::Api { status: status.as_u16(), body })
    }

    async fn create_dataset(&self, metas: &[MetadataEntry]) -> ClientResult<String> {
        let url = format!("{}/datasets", self.base_url);
        let response = self
            .request(self.http.post(&url))
            .json(&json!({ "metas": metas }))
            .send()
            .await
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;
        if !status.is_success() {
            return Err(ClientError::Api { status: status.as_u16(), body });
        }

        let value: Value =
            serde_json::from_str(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        value
            .get("identifier")
            .or_else(|| value.get("id"))
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| {
                ClientError::InvalidResponse("create response carries no identifier".to_string())
            })
    }
}
