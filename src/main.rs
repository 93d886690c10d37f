use anyhow::Result;
use dashboard_gateway::{config::Config, web, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting dashboard gateway");

    // Load configuration from environment
    let config = Config::load()?;
    tracing::info!(
        client_app_url = %config.client_app_url,
        redirect_uri = %config.oauth.redirect_uri,
        currency_symbols = ?config.upstream.currency_symbols,
        "Configuration loaded"
    );

    let bind_address = config.bind_address();

    // Create shared application state
    let state = Arc::new(AppState::from_config(config)?);

    let app = web::create_router(state);

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Gateway listening on {}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
