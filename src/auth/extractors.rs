use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use std::convert::Infallible;

/// Bearer credential presented by the browser, if any
///
/// Taken from `Authorization: Bearer <token>` first, then from the
/// `access_token` query parameter the client application uses. Never fails;
/// adapters that need a credential reject its absence themselves.
///
/// Usage:
/// ```rust,ignore
/// async fn handler(BearerCredential(token): BearerCredential) {
///     if let Some(token) = token { /* forward upstream */ }
/// }
/// ```
pub struct BearerCredential(pub Option<String>);

impl std::fmt::Debug for BearerCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shown = self.0.as_ref().map(|_| "[redacted]");
        f.debug_tuple("BearerCredential").field(&shown).finish()
    }
}

impl<S> FromRequestParts<S> for BearerCredential
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let from_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().split_once(' '))
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
            .map(|(_, t)| t.trim().to_string());

        let token = from_header.or_else(|| {
            parts.uri.query().and_then(|query| {
                url::form_urlencoded::parse(query.as_bytes())
                    .find(|(k, _)| k == "access_token")
                    .map(|(_, v)| v.into_owned())
            })
        });

        Ok(BearerCredential(token.filter(|t| !t.is_empty())))
    }
}
