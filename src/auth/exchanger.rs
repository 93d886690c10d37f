//! OAuth2 authorization-code exchange against the identity provider
//!
//! The exchanger owns a pre-validated `oauth2` client for the token endpoint
//! and a shared `reqwest` client. It keeps no per-login state; the only
//! in-flight value is the authorization code for the duration of one call.

use oauth2::{
    basic::{BasicClient, BasicErrorResponse},
    AccessToken, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
    HttpRequest, HttpResponse, RedirectUrl, RequestTokenError, TokenResponse, TokenUrl,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::borrow::Cow;
use url::Url;

use super::helpers::{build_authorization_url, redact_secret};
use crate::config::OAuthConfig;
use crate::error::GatewayError;

/// Provider name reported in errors and logs
pub const IDENTITY_PROVIDER: &str = "github";

/// Client configured with a token endpoint only; the authorize URL is built
/// by hand so that it stays deterministic.
type TokenClient =
    BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

// =============================================================================
// Types
// =============================================================================

/// Bearer credential obtained from the identity provider
///
/// `Debug` never prints the token.
#[derive(Debug, Clone)]
pub struct AccessCredential {
    token: AccessToken,
    scopes: Vec<String>,
}

impl AccessCredential {
    pub fn secret(&self) -> &str {
        self.token.secret()
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }
}

/// Failure of the authorization-code exchange
///
/// Provider bodies are carried for diagnosis with the client secret scrubbed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeError {
    #[error("callback carried no authorization code")]
    MissingCode,

    #[error("provider denied authorization: {error}")]
    Denied {
        error: String,
        description: Option<String>,
    },

    #[error("token endpoint returned status {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("provider rejected the authorization code: {error}")]
    Rejected {
        status: u16,
        error: String,
        description: Option<String>,
        body: String,
    },

    #[error("malformed token response (status {status}): {reason}")]
    Malformed {
        status: u16,
        reason: String,
        body: String,
    },

    #[error("token endpoint unreachable: {reason}")]
    Transport { reason: String, timed_out: bool },
}

impl ExchangeError {
    /// HTTP status reported by the provider, if the provider answered
    pub fn provider_status(&self) -> Option<u16> {
        match self {
            ExchangeError::Provider { status, .. }
            | ExchangeError::Rejected { status, .. }
            | ExchangeError::Malformed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ExchangeError> for GatewayError {
    fn from(_: ExchangeError) -> Self {
        GatewayError::exchange(IDENTITY_PROVIDER, "Failed to authenticate")
    }
}

/// Error body some providers send with a 200 status
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Transport-level failure of the token request
#[derive(Debug, thiserror::Error)]
enum TokenTransportError {
    #[error("{0}")]
    Network(#[source] reqwest::Error),
    #[error("token endpoint returned status {status}")]
    Status { status: u16, body: String },
}

// =============================================================================
// Exchanger
// =============================================================================

pub struct CredentialExchanger {
    client: TokenClient,
    client_id: String,
    client_secret: SecretString,
    authorize_url: Url,
    redirect_uri: Url,
    scope: String,
    http: reqwest::Client,
}

impl CredentialExchanger {
    pub fn new(config: &OAuthConfig, http: reqwest::Client) -> Self {
        let client = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_client_secret(ClientSecret::new(
                config.client_secret.expose_secret().clone(),
            ))
            .set_token_uri(TokenUrl::from_url(config.token_url.clone()));

        tracing::info!(
            authorize_url = %config.authorize_url,
            token_url = %config.token_url,
            redirect_uri = %config.redirect_uri,
            scope = %config.scope,
            "Credential exchanger initialized"
        );

        Self {
            client,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            authorize_url: config.authorize_url.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scope: config.scope.clone(),
            http,
        }
    }

    /// Authorize URL the browser is sent to
    pub fn build_authorization_redirect(&self) -> Url {
        build_authorization_url(
            &self.authorize_url,
            &self.client_id,
            &self.redirect_uri,
            &self.scope,
        )
    }

    /// Redirect URI registered with the provider
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    /// Exchange an authorization code for a bearer credential
    ///
    /// Exactly one request is made. A code is single-use at the provider, so
    /// failures are never retried.
    pub async fn exchange_code(
        &self,
        code: AuthorizationCode,
        redirect_uri: &Url,
    ) -> Result<AccessCredential, ExchangeError> {
        tracing::debug!(
            code_length = code.secret().len(),
            "Exchanging authorization code for access token"
        );

        let http = self.http.clone();
        let send = move |request: HttpRequest| send_token_request(http.clone(), request);

        let result = self
            .client
            .exchange_code(code)
            .set_redirect_uri(Cow::Owned(RedirectUrl::from_url(redirect_uri.clone())))
            .request_async(&send)
            .await;

        let token_response = result.map_err(|e| self.classify(e))?;

        let token = token_response.access_token().clone();
        if token.secret().trim().is_empty() {
            return Err(ExchangeError::Malformed {
                status: 200,
                reason: "empty access_token".to_string(),
                body: String::new(),
            });
        }

        let scopes = token_response
            .scopes()
            .map(|scopes| scopes.iter().map(|s| s.as_str().to_owned()).collect())
            .unwrap_or_default();

        Ok(AccessCredential { token, scopes })
    }

    fn classify(
        &self,
        error: RequestTokenError<TokenTransportError, BasicErrorResponse>,
    ) -> ExchangeError {
        let secret = self.client_secret.expose_secret().as_str();

        match error {
            RequestTokenError::Request(TokenTransportError::Status { status, body }) => {
                ExchangeError::Provider {
                    status,
                    body: redact_secret(&body, secret),
                }
            }
            RequestTokenError::Request(TokenTransportError::Network(e)) => {
                let e = e.without_url();
                ExchangeError::Transport {
                    timed_out: e.is_timeout(),
                    reason: redact_secret(&e.to_string(), secret),
                }
            }
            RequestTokenError::ServerResponse(response) => ExchangeError::Rejected {
                status: 200,
                error: response.error().as_ref().to_string(),
                description: response
                    .error_description()
                    .map(|d| redact_secret(d, secret)),
                body: serde_json::to_string(&response)
                    .map(|body| redact_secret(&body, secret))
                    .unwrap_or_default(),
            },
            RequestTokenError::Parse(e, body) => {
                let body = String::from_utf8_lossy(&body).into_owned();
                match serde_json::from_str::<ProviderErrorBody>(&body) {
                    Ok(provider_error) => ExchangeError::Rejected {
                        status: 200,
                        error: provider_error.error,
                        description: provider_error
                            .error_description
                            .map(|d| redact_secret(&d, secret)),
                        body: redact_secret(&body, secret),
                    },
                    Err(_) => ExchangeError::Malformed {
                        status: 200,
                        reason: e.to_string(),
                        body: redact_secret(&body, secret),
                    },
                }
            }
            RequestTokenError::Other(reason) => ExchangeError::Malformed {
                status: 200,
                reason: redact_secret(&reason, secret),
                body: String::new(),
            },
        }
    }
}

/// Send a token request through reqwest
///
/// Anything but 200 becomes a `Status` error so the provider's status and
/// body survive into `ExchangeError`.
async fn send_token_request(
    client: reqwest::Client,
    request: HttpRequest,
) -> Result<HttpResponse, TokenTransportError> {
    let (parts, body) = request.into_parts();

    let response = client
        .request(parts.method, parts.uri.to_string())
        .headers(parts.headers)
        .body(body)
        .send()
        .await
        .map_err(TokenTransportError::Network)?;

    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .bytes()
        .await
        .map_err(TokenTransportError::Network)?;

    if status != reqwest::StatusCode::OK {
        return Err(TokenTransportError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    let mut http_response = HttpResponse::new(body.to_vec());
    *http_response.status_mut() = status;
    *http_response.headers_mut() = headers;
    Ok(http_response)
}

// =============================================================================
// Tests
// =============================================================================
