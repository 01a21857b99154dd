use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use catalog_api::cli::{ensure_admin, ServeArgs, DEFAULT_LOG_FILTER};
use catalog_api::config::{self, StoreBackend};
use catalog_api::database::{DocumentStore, MemoryStore, PgStore};
use catalog_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let args = ServeArgs::parse();

    let filter = EnvFilter::try_new(&args.log).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Initialize configuration (this loads the config singleton)
    let mut config = config::config().clone();
    args.apply(&mut config);
    info!("Starting Catalog API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set outside development");
    }

    let store: Arc<dyn DocumentStore> = match config.database.backend {
        StoreBackend::Memory => {
            info!("Using in-memory document store");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Postgres => Arc::new(
            PgStore::connect(&config.database)
                .await
                .context("failed to connect to PostgreSQL")?,
        ),
    };

    if let Some((email, password)) = args.admin_credentials() {
        ensure_admin(store.as_ref(), email, password)
            .await
            .context("failed to bootstrap admin account")?;
    }

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let app = app(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Catalog API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Catalog API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
