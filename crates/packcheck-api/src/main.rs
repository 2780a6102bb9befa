//! # packcheck-api: Binary Entry Point
//!
//! Starts the Axum HTTP server. Configuration comes from the environment:
//! `PORT`, `DATABASE_URL`, `PACKCHECK_SEED`, `PACKCHECK_METRICS_ENABLED`,
//! `PACKCHECK_LOG_JSON`, and `RUST_LOG`.

use packcheck_api::state::{AppConfig, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured tracing.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("PACKCHECK_LOG_JSON")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = AppConfig::from_env();
    let port = config.port;
    let seed_path = config.seed_path.clone();

    // Initialize database pool (optional; absent means in-memory only).
    let db_pool = packcheck_api::db::init_pool().await.map_err(|e| {
        tracing::error!("Database initialization failed: {e}");
        e
    })?;

    let state = AppState::with_config(config, db_pool);

    // Hydrate in-memory stores from database (if connected).
    state.hydrate_from_db().await.map_err(|e| {
        tracing::error!("Database hydration failed: {e}");
        e
    })?;

    if let Some(path) = seed_path {
        state.seed_from_snapshot(&path).await.map_err(|e| {
            tracing::error!(path = %path.display(), "Registry seeding failed: {e}");
            e
        })?;
    }

    let app = packcheck_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("packcheck API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
