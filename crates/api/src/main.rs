use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use persistence::realtime::PgCourierFeed;
use persistence::repositories::PgSettingsStore;
use storefront_api::{app, config, middleware, services};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = config::Config::load()?;

    middleware::logging::init_logging(&config.logging)?;
    middleware::init_metrics()?;

    info!("Starting Storefront API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&(&config.database).into()).await?;

    info!("Running database migrations...");
    persistence::db::run_migrations(&pool).await?;
    info!("Migrations completed");

    let addr = config.socket_addr();
    let realtime = config.realtime.clone();

    let store = Arc::new(PgSettingsStore::new(pool.clone()));
    let mut state = app::AppState::new(config, pool.clone(), store)?;

    let bridge = if realtime.enabled {
        let feed = Arc::new(PgCourierFeed::new(pool.clone()));
        let handle = services::CourierBridge::new(
            feed,
            state.cache.clone(),
            state.notices.clone(),
            services::BackoffPolicy::new(realtime.backoff_initial(), realtime.backoff_max()),
        )
        .spawn();
        state = state.with_realtime(handle.watch_state());
        info!(
            channel = domain::models::COURIER_STATUS_CHANNEL,
            "Courier status bridge started"
        );
        Some(handle)
    } else {
        warn!("Realtime courier updates disabled");
        None
    };

    let shutdown = state.shutdown_trigger();
    let stopped = state.shutdown_signal();
    tokio::spawn(async move {
        wait_for_ctrl_c().await;
        shutdown.send_replace(true);
    });

    let app = app::create_app(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(stopped)
        .await?;

    if let Some(handle) = bridge {
        handle.teardown().await;
    }
    pool.close().await;
    info!("Shutdown complete");

    Ok(())
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
