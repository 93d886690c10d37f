//! Router-facing error taxonomy
//!
//! Every adapter and the credential exchanger convert their failures into a
//! `GatewayError` at their own boundary; the router only translates the kind
//! into an HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Classification of a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed inbound parameter (client's fault)
    Validation,
    /// Non-2xx, malformed body, timeout or network failure from a provider
    Upstream,
    /// Authorization-code exchange failed
    Exchange,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{provider}: {message}")]
pub struct GatewayError {
    pub kind: ErrorKind,
    pub message: String,
    pub provider: &'static str,
}

impl GatewayError {
    pub fn validation(provider: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: message.into(),
            provider,
        }
    }

    pub fn upstream(provider: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Upstream,
            message: message.into(),
            provider,
        }
    }

    pub fn exchange(provider: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Exchange,
            message: message.into(),
            provider,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
            ErrorKind::Exchange => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(json!({
                "error": self.message,
                "provider": self.provider,
            })),
        )
            .into_response()
    }
}
