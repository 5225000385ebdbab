mod config;
mod fetcher;
mod model;
mod routes;
mod selector;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::fetcher::Fetcher;
use crate::routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finance_pulse=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load("feeds.toml")?;
    info!("Loaded {} feeds from configuration", config.feeds.len());

    let tz = config.display_offset()?;
    let fetcher = Arc::new(Fetcher::new());

    // Create app state
    let state = Arc::new(AppState {
        config,
        tz,
        fetcher,
    });

    // Build router
    let app = Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
    info!("Server starting on http://localhost:5000");

    axum::serve(listener, app).await?;

    Ok(())
}
