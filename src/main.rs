use anyhow::Context;
use tracing_subscriber::EnvFilter;

use tmtrack_api::app::{router, AppState};
use tmtrack_api::auth::AuthDirectory;
use tmtrack_api::database::{manager::redact_url, Stores};
use tmtrack_api::config::{self, StoreBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, TMTRACK_STORE, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting tmtrack API in {:?} mode", config.environment);

    let directory = AuthDirectory::load(&config.auth.credentials_path, &config.auth.memberships_path);

    let stores = Stores::from_config(config).context("invalid store configuration")?;
    match config.store.backend {
        StoreBackend::Postgres => tracing::info!(
            "Using PostgreSQL store at {} (connects on first use)",
            redact_url(&config.database.url)
        ),
        StoreBackend::Memory => tracing::warn!("Using in-memory store; data is lost on exit"),
    }

    let app = router(AppState::new(directory, stores, config), config);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("tmtrack API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
