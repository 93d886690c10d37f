//! Upstream proxy set
//!
//! One adapter per external data provider, all behind `UpstreamAdapter`.
//! The router picks an adapter from `AdapterSet` by `ProviderKind`, so error
//! handling is uniform and each adapter is testable on its own.

pub mod currency;
pub mod http;
pub mod public_apis;
pub mod repos;
pub mod weather;

use async_trait::async_trait;
use axum::{
    body::Bytes,
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::UpstreamConfig;
use crate::error::GatewayError;

pub use currency::{CurrencyRatesAdapter, RatesQuery};
pub use public_apis::PublicApisAdapter;
pub use repos::RepositoriesAdapter;
pub use weather::WeatherAdapter;

/// Key of the adapter lookup table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Repositories,
    Weather,
    CurrencyRates,
    HistoricalRates,
    PublicApis,
}

/// Inbound request as seen by an adapter
#[derive(Clone, Default)]
pub struct UpstreamRequest {
    pub query: HashMap<String, String>,
    pub bearer: Option<String>,
}

impl UpstreamRequest {
    /// Non-blank query parameter, trimmed
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

impl std::fmt::Debug for UpstreamRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&String> = self.query.keys().collect();
        keys.sort();
        f.debug_struct("UpstreamRequest")
            .field("query_keys", &keys)
            .field("has_bearer", &self.bearer.is_some())
            .finish()
    }
}

/// Successful adapter outcome
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamPayload {
    /// Provider body forwarded byte for byte
    Passthrough(Bytes),
    /// JSON rebuilt by the gateway
    Normalized(Value),
}

impl IntoResponse for UpstreamPayload {
    fn into_response(self) -> Response {
        match self {
            UpstreamPayload::Passthrough(raw) => {
                ([(CONTENT_TYPE, "application/json")], raw).into_response()
            }
            UpstreamPayload::Normalized(value) => Json(value).into_response(),
        }
    }
}

#[cfg(test)]
impl UpstreamPayload {
    pub(crate) fn json(&self) -> Value {
        match self {
            UpstreamPayload::Passthrough(raw) => serde_json::from_slice(raw).unwrap(),
            UpstreamPayload::Normalized(value) => value.clone(),
        }
    }
}

/// Success payload or a request-scoped error
pub type UpstreamResponse = Result<UpstreamPayload, GatewayError>;

#[async_trait]
pub trait UpstreamAdapter: Send + Sync {
    /// Provider name used in errors and logs
    fn provider(&self) -> &'static str;

    /// Validate, make at most one upstream call, normalize the outcome
    async fn handle(&self, request: UpstreamRequest) -> UpstreamResponse;
}

/// Lookup table from route kind to adapter
#[derive(Clone, Default)]
pub struct AdapterSet {
    adapters: HashMap<ProviderKind, Arc<dyn UpstreamAdapter>>,
}

impl AdapterSet {
    pub fn from_config(config: &UpstreamConfig, http: reqwest::Client) -> anyhow::Result<Self> {
        let set = AdapterSet::default()
            .with(
                ProviderKind::Repositories,
                Arc::new(RepositoriesAdapter::new(&config.github_api_url, http.clone())?),
            )
            .with(
                ProviderKind::Weather,
                Arc::new(WeatherAdapter::new(config, http.clone())?),
            )
            .with(
                ProviderKind::CurrencyRates,
                Arc::new(CurrencyRatesAdapter::new(config, RatesQuery::Latest, http.clone())?),
            )
            .with(
                ProviderKind::HistoricalRates,
                Arc::new(CurrencyRatesAdapter::new(config, RatesQuery::Historical, http.clone())?),
            )
            .with(
                ProviderKind::PublicApis,
                Arc::new(PublicApisAdapter::new(&config.public_apis_url, http)?),
            );

        tracing::info!(adapters = set.adapters.len(), "Upstream adapters registered");
        Ok(set)
    }

    pub fn with(mut self, kind: ProviderKind, adapter: Arc<dyn UpstreamAdapter>) -> Self {
        self.adapters.insert(kind, adapter);
        self
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&Arc<dyn UpstreamAdapter>> {
        self.adapters.get(&kind)
    }

    /// Route a request to the adapter registered for `kind`
    pub async fn dispatch(&self, kind: ProviderKind, request: UpstreamRequest) -> UpstreamResponse {
        let Some(adapter) = self.get(kind) else {
            tracing::error!(kind = ?kind, "No adapter registered");
            return Err(GatewayError::upstream("gateway", "Provider not configured"));
        };

        let result = adapter.handle(request).await;
        if let Err(error) = &result {
            tracing::info!(
                event = "upstream_request_failed",
                provider = adapter.provider(),
                kind = ?error.kind,
                message = %error.message,
                "Request failed"
            );
        }
        result
    }
}
