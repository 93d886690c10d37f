use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::http::{endpoint, fetch_json, malformed};
use super::{UpstreamAdapter, UpstreamPayload, UpstreamRequest, UpstreamResponse};
use crate::config::UpstreamConfig;
use crate::error::GatewayError;

const PROVIDER: &str = "weather";

/// Daily forecast for a city; the API key travels as the `token` parameter
pub struct WeatherAdapter {
    http: reqwest::Client,
    endpoint: Url,
    api_key: SecretString,
    forecast_day: u8,
}

impl WeatherAdapter {
    pub fn new(config: &UpstreamConfig, http: reqwest::Client) -> anyhow::Result<Self> {
        Ok(Self {
            http,
            endpoint: endpoint(&config.weather_api_url, "api/v1/weather/simple")?,
            api_key: config.weather_api_key.clone(),
            forecast_day: config.weather_forecast_day,
        })
    }
}

#[async_trait]
impl UpstreamAdapter for WeatherAdapter {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn handle(&self, request: UpstreamRequest) -> UpstreamResponse {
        let city = request
            .param("city")
            .ok_or_else(|| GatewayError::validation(PROVIDER, "City parameter is required"))?;

        let day = self.forecast_day.to_string();
        let call = self.http.get(self.endpoint.clone()).query(&[
            ("city", city),
            ("day", day.as_str()),
            ("token", self.api_key.expose_secret().as_str()),
        ]);

        // Forecast object is passed through unmodified
        let body = fetch_json(PROVIDER, call).await?;
        if !body.value.is_object() {
            return Err(malformed(PROVIDER));
        }
        Ok(UpstreamPayload::Passthrough(body.raw))
    }
}
