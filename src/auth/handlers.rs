//! Authentication handlers for the login redirect and the provider callback
//!
//! - `login_handler`: sends the browser to the identity provider
//! - `callback_handler`: exchanges the code and redirects to the client app
//!   with the credential

use axum::{
    extract::{Query, State},
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use url::Url;

use super::flow::{CallbackParams, FlowStage, Start};
use crate::error::GatewayError;

/// 302 Found to `url`
fn found(url: &Url) -> Response {
    (StatusCode::FOUND, [(LOCATION, url.as_str().to_string())]).into_response()
}

/// Login handler - initiates the OAuth2 authorization code flow
pub async fn login_handler(State(state): State<Arc<crate::AppState>>) -> Response {
    let redirected = Start::new().redirect(&state.exchanger);

    tracing::info!(
        stage = ?redirected.stage(),
        authorize_host = ?redirected.authorize_url().host_str(),
        "Redirecting to identity provider for authentication"
    );

    found(redirected.authorize_url())
}

/// Callback handler - exchanges the authorization code and hands the
/// credential to the client application
pub async fn callback_handler(
    Query(params): Query<CallbackParams>,
    State(state): State<Arc<crate::AppState>>,
) -> Result<Response, GatewayError> {
    tracing::info!("OAuth callback received");

    let received = Start::new().receive_callback(params).map_err(|e| {
        tracing::warn!(stage = ?FlowStage::Failed, error = %e, "OAuth callback rejected");
        GatewayError::from(e)
    })?;

    tracing::debug!(
        stage = ?received.stage(),
        code_length = received.code_length(),
        "Authorization code received"
    );

    let exchanged = received.exchange(&state.exchanger).await.map_err(|e| {
        tracing::error!(
            stage = ?FlowStage::Failed,
            provider_status = ?e.provider_status(),
            error = %e,
            "Failed to exchange code for access token"
        );
        GatewayError::from(e)
    })?;

    tracing::info!(
        stage = ?exchanged.stage(),
        scopes = ?exchanged.scopes(),
        "Authentication successful, redirecting to client application"
    );

    Ok(found(&exchanged.hand_off(&state.config.client_app_url)))
}
