use async_trait::async_trait;
use url::Url;

use super::http::{endpoint, fetch_json, malformed};
use super::{UpstreamAdapter, UpstreamPayload, UpstreamRequest, UpstreamResponse};

const PROVIDER: &str = "public-apis";

/// Public API directory, no authentication
pub struct PublicApisAdapter {
    http: reqwest::Client,
    endpoint: Url,
}

impl PublicApisAdapter {
    pub fn new(api_url: &Url, http: reqwest::Client) -> anyhow::Result<Self> {
        Ok(Self {
            http,
            endpoint: endpoint(api_url, "entries")?,
        })
    }
}

#[async_trait]
impl UpstreamAdapter for PublicApisAdapter {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn handle(&self, _request: UpstreamRequest) -> UpstreamResponse {
        let body = fetch_json(PROVIDER, self.http.get(self.endpoint.clone())).await?;

        // The client reads `entries`; anything else is not a directory listing
        if !body.value.get("entries").is_some_and(|e| e.is_array()) {
            return Err(malformed(PROVIDER));
        }
        Ok(UpstreamPayload::Passthrough(body.raw))
    }
}
