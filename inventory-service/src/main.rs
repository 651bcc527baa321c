use anyhow::Result;
use clap::Parser;
use inventory_service::{api, config::Config, db, store::PgProductStore};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let config = Config::parse();

    info!("Connecting to database {}", config.describe_database());
    let pool = db::connect(&config).await?;
    info!(
        "Connection pool ready (max_size={}, timeout={}s)",
        config.pool_max_size, config.pool_timeout_secs
    );

    let app_state = api::AppState::new(Arc::new(PgProductStore::new(pool)));
    let app = api::create_router(app_state);
    let listener = tokio::net::TcpListener::bind(config.socket_addr()).await?;

    info!("Server is running on http://{}", config.socket_addr());

    axum::serve(listener, app).await?;

    Ok(())
}
