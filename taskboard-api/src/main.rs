//! # Taskboard API Server
//!
//! Serves task CRUD under `/api` on top of Cosmos DB, plus the single-page
//! app from `STATIC_DIR`.
//!
//! ## Startup
//!
//! 1. Load configuration (fails fast without `COSMOS_DB_URI` / `COSMOS_DB_KEY`)
//! 2. Build the task store and provision the `todos` database and `tasks` container
//! 3. Bind the listener and serve until Ctrl-C
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskboard-api
//! ```

use std::sync::Arc;
use taskboard_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskboard_shared::{cosmos::CosmosTaskStore, store::TaskStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "taskboard_api=debug,taskboard_shared=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Taskboard API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let store = CosmosTaskStore::new(config.cosmos.clone())?;
    store.init().await?;

    let bind_address = config.bind_address();
    let state = AppState::new(Arc::new(store), config.api);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        return;
    }
    tracing::info!("Shutdown signal received, exiting...");
}
