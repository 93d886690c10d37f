//! Dashboard gateway library
//!
//! Backend-for-frontend: OAuth2 login against the identity provider plus
//! read-only proxies for the dashboard's data providers.

#![deny(dead_code)]

pub mod auth;
pub mod config;
pub mod error;
pub mod rates;
pub mod upstream;
pub mod web;

use auth::CredentialExchanger;
use config::Config;
use std::sync::Arc;
use upstream::AdapterSet;

/// Read-only state shared by all requests
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub exchanger: Arc<CredentialExchanger>,
    pub adapters: Arc<AdapterSet>,
}

impl AppState {
    /// Build the HTTP client, the credential exchanger and the adapter table
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let http = upstream::http::create_http_client(
            config.http_connect_timeout_secs,
            config.http_request_timeout_secs,
        )
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        let exchanger = CredentialExchanger::new(&config.oauth, http.clone());
        let adapters = AdapterSet::from_config(&config.upstream, http)?;

        Ok(AppState {
            config: Arc::new(config),
            exchanger: Arc::new(exchanger),
            adapters: Arc::new(adapters),
        })
    }
}
