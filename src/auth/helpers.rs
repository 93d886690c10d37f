//! Pure helper functions for the authorization-code flow
//!
//! URL builders and secret scrubbing. Nothing here performs I/O.

use url::Url;

const REDACTED: &str = "[redacted]";

// =============================================================================
// URL Builders
// =============================================================================

/// Build the identity provider's authorize URL
///
/// Deterministic: the same inputs always yield the same URL. No `state`
/// parameter is added since the gateway keeps nothing between the redirect
/// and the callback.
pub fn build_authorization_url(
    authorize_endpoint: &Url,
    client_id: &str,
    redirect_uri: &Url,
    scope: &str,
) -> Url {
    let mut url = authorize_endpoint.clone();
    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri.as_str());
    if !scope.trim().is_empty() {
        url.query_pairs_mut().append_pair("scope", scope);
    }
    url
}

/// Build the client application URL carrying the credential
///
/// Known weakness: the credential travels in the query string of this
/// redirect hop.
pub fn build_client_redirect_url(client_app_url: &Url, access_token: &str) -> Url {
    let mut url = client_app_url.clone();
    url.query_pairs_mut()
        .append_pair("access_token", access_token);
    url
}

// =============================================================================
// Secret Scrubbing
// =============================================================================

/// Replace every occurrence of `secret` in `text`
pub fn redact_secret(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret, REDACTED)
}
