use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use portfolio_chat::{
    config::Config,
    routes,
    services::{chatbot::OpenRouterClient, portfolio::Portfolio},
    state::AppState,
};

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("portfolio_chat=info,tower_http=info")),
        )
        .init();

    let portfolio = match &config.portfolio_path {
        Some(path) => Portfolio::load(path).await?,
        None => Portfolio::sample()?,
    };
    if config.openrouter_api_key.is_none() {
        tracing::warn!("OPENROUTER_API_KEY is not set; chat requests will fail");
    }

    let backend = OpenRouterClient::new(&config).context("failed to build completion client")?;
    let state = Arc::new(AppState::new(&config, portfolio, Arc::new(backend)));

    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            let removed = sessions.purge_expired().await;
            if removed > 0 {
                tracing::debug!(removed, "purged expired sessions");
            }
        }
    });

    let app = routes::create_router(&config.static_dir)
        .with_state(state)
        .layer(CorsLayer::very_permissive());

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, model = %config.model, "portfolio chatbot listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
