use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, MethodRouter},
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    auth::BearerCredential,
    error::GatewayError,
    upstream::{ProviderKind, UpstreamPayload, UpstreamRequest},
    AppState,
};

/// Liveness probe - always returns OK if the process is running
pub async fn healthz_handler() -> impl IntoResponse {
    StatusCode::OK
}

/// GET route served by the adapter registered for `kind`
pub fn proxied(kind: ProviderKind) -> MethodRouter<Arc<AppState>> {
    get(
        move |State(state): State<Arc<AppState>>,
              BearerCredential(bearer): BearerCredential,
              Query(query): Query<HashMap<String, String>>| async move {
            proxy_handler(state, kind, bearer, query).await
        },
    )
}

/// Forward one inbound request to exactly one adapter
pub async fn proxy_handler(
    state: Arc<AppState>,
    kind: ProviderKind,
    bearer: Option<String>,
    mut query: HashMap<String, String>,
) -> Result<UpstreamPayload, GatewayError> {
    // The credential is carried separately from ordinary parameters
    query.remove("access_token");

    let request = UpstreamRequest { query, bearer };
    tracing::debug!(kind = ?kind, request = ?request, "Dispatching upstream request");

    state.adapters.dispatch(kind, request).await
}
