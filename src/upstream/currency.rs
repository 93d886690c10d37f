use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::http::{endpoint, fetch_json, malformed};
use super::{UpstreamAdapter, UpstreamPayload, UpstreamRequest, UpstreamResponse};
use crate::config::UpstreamConfig;
use crate::error::GatewayError;
use crate::rates::CurrencyRates;

/// Which rates table to request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatesQuery {
    Latest,
    /// Table for the `date` query parameter (`YYYY-MM-DD`)
    Historical,
}

impl RatesQuery {
    fn provider(self) -> &'static str {
        match self {
            RatesQuery::Latest => "currency-rates",
            RatesQuery::Historical => "currency-history",
        }
    }

    fn path(self) -> &'static str {
        match self {
            RatesQuery::Latest => "v2.0/rates/latest",
            RatesQuery::Historical => "v2.0/rates/historical",
        }
    }
}

/// Exchange rates restricted to the configured symbol allow-list
///
/// The provider's table is re-emitted as `{date, base, rates}` with numeric
/// rates; a table without an explicit base is rejected.
pub struct CurrencyRatesAdapter {
    http: reqwest::Client,
    endpoint: Url,
    api_key: SecretString,
    symbols: String,
    query: RatesQuery,
}

impl CurrencyRatesAdapter {
    pub fn new(
        config: &UpstreamConfig,
        query: RatesQuery,
        http: reqwest::Client,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            http,
            endpoint: endpoint(&config.currency_api_url, query.path())?,
            api_key: config.currency_api_key.clone(),
            symbols: config.currency_symbols.join(","),
            query,
        })
    }

    fn requested_date(&self, request: &UpstreamRequest) -> Result<String, GatewayError> {
        let provider = self.query.provider();
        let raw = request
            .param("date")
            .ok_or_else(|| GatewayError::validation(provider, "Date parameter is required"))?;
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            GatewayError::validation(provider, "Date parameter must be formatted as YYYY-MM-DD")
        })?;
        Ok(date.format("%Y-%m-%d").to_string())
    }
}

#[async_trait]
impl UpstreamAdapter for CurrencyRatesAdapter {
    fn provider(&self) -> &'static str {
        self.query.provider()
    }

    async fn handle(&self, request: UpstreamRequest) -> UpstreamResponse {
        let provider = self.query.provider();

        let mut params = vec![
            ("apikey", self.api_key.expose_secret().clone()),
            ("symbols", self.symbols.clone()),
        ];
        if self.query == RatesQuery::Historical {
            params.push(("date", self.requested_date(&request)?));
        }

        let call = self.http.get(self.endpoint.clone()).query(&params);
        let body = fetch_json(provider, call).await?;

        let rates: CurrencyRates = serde_json::from_value(body.value).map_err(|e| {
            tracing::warn!(provider, error = %e, "Currency rates payload rejected");
            malformed(provider)
        })?;

        serde_json::to_value(&rates)
            .map(UpstreamPayload::Normalized)
            .map_err(|_| malformed(provider))
    }
}
