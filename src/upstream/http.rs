//! HTTP plumbing shared by every upstream call
//!
//! One outbound request per call, no retries. Every failure is converted to
//! a `GatewayError` here so no transport error escapes an adapter.

use axum::body::Bytes;
use serde_json::Value;
use std::time::{Duration, Instant};
use url::Url;

use crate::error::GatewayError;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Create the reqwest client used for provider calls using config timeouts
pub fn create_http_client(
    connect_timeout_secs: u64,
    request_timeout_secs: u64,
) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none()) // Security: prevent SSRF
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .timeout(Duration::from_secs(request_timeout_secs))
        .build()
}

/// Append `path` to a provider base URL
pub fn endpoint(base: &Url, path: &str) -> anyhow::Result<Url> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|e| anyhow::anyhow!("Invalid endpoint {}: {}", joined, e))
}

/// Body of a successful provider response
///
/// `raw` is exactly what the provider sent; `value` is only for shape checks
/// and normalization.
#[derive(Debug)]
pub struct ProviderBody {
    pub raw: Bytes,
    pub value: Value,
}

/// Send one request and decode its JSON body
pub async fn fetch_json(
    provider: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<ProviderBody, GatewayError> {
    let started = Instant::now();

    let response = request
        .send()
        .await
        .map_err(|e| transport_error(provider, e))?;

    let status = response.status();
    if !status.is_success() {
        let body_len = response.bytes().await.map(|b| b.len()).unwrap_or(0);
        tracing::warn!(
            event = "upstream_error_status",
            provider,
            status = %status,
            body_len,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Upstream provider returned an error status"
        );
        return Err(GatewayError::upstream(
            provider,
            format!("{} responded with status {}", provider, status.as_u16()),
        ));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| transport_error(provider, e))?;

    let value = serde_json::from_slice::<Value>(&body).map_err(|e| {
        tracing::warn!(
            event = "upstream_malformed_body",
            provider,
            error = %e,
            body_len = body.len(),
            "Upstream provider returned a body that is not JSON"
        );
        malformed(provider)
    })?;

    tracing::debug!(
        event = "upstream_ok",
        provider,
        status = %status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Upstream call succeeded"
    );

    Ok(ProviderBody { raw: body, value })
}

/// Error for a provider body that does not have the expected shape
pub fn malformed(provider: &'static str) -> GatewayError {
    GatewayError::upstream(provider, format!("{} returned a malformed response", provider))
}

fn transport_error(provider: &'static str, error: reqwest::Error) -> GatewayError {
    // URLs carry API keys in their query strings
    let error = error.without_url();

    if error.is_timeout() {
        tracing::warn!(event = "upstream_timeout", provider, error = %error, "Upstream call timed out");
        GatewayError::upstream(provider, format!("{} timed out", provider))
    } else {
        tracing::warn!(event = "upstream_unreachable", provider, error = %error, "Upstream call failed");
        GatewayError::upstream(provider, format!("{} is unreachable", provider))
    }
}

/// Base URL of a server that accepts connections and never answers
#[cfg(test)]
pub(crate) async fn silent_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{}", addr)
}
