use async_trait::async_trait;
use reqwest::header::ACCEPT;
use url::Url;

use super::http::{endpoint, fetch_json, malformed};
use super::{UpstreamAdapter, UpstreamPayload, UpstreamRequest, UpstreamResponse};
use crate::error::GatewayError;

const PROVIDER: &str = "github";

/// Repositories of the authenticated user, using the caller's bearer credential
pub struct RepositoriesAdapter {
    http: reqwest::Client,
    endpoint: Url,
}

impl RepositoriesAdapter {
    pub fn new(api_url: &Url, http: reqwest::Client) -> anyhow::Result<Self> {
        Ok(Self {
            http,
            endpoint: endpoint(api_url, "user/repos")?,
        })
    }
}

#[async_trait]
impl UpstreamAdapter for RepositoriesAdapter {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn handle(&self, request: UpstreamRequest) -> UpstreamResponse {
        let token = request
            .bearer
            .as_deref()
            .ok_or_else(|| GatewayError::validation(PROVIDER, "access_token parameter is required"))?;

        let call = self
            .http
            .get(self.endpoint.clone())
            .bearer_auth(token)
            .header(ACCEPT, "application/vnd.github+json");

        let body = fetch_json(PROVIDER, call).await?;
        if !body.value.is_array() {
            return Err(malformed(PROVIDER));
        }
        Ok(UpstreamPayload::Passthrough(body.raw))
    }
}
