//! Guestlist HTTP server.
//!
//! Connects to `PostgreSQL`, applies migrations, starts the Prometheus exporter and
//! serves the JSON API until Ctrl+C.

use guestlist_core::environment::SystemClock;
use guestlist_core::invite::InviteLinkBuilder;
use guestlist_postgres::PgLifecycleStore;
use guestlist_runtime::metrics::MetricsServer;
use guestlist_runtime::{LifecycleEnvironment, WebhookDispatcher};
use guestlist_web::{AppState, Config, build_router};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,guestlist=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        host = %config.server.host,
        port = config.server.port,
        invite_base_url = %config.invite_base_url,
        "Configuration loaded"
    );

    info!("Connecting to database...");
    let store = Arc::new(
        PgLifecycleStore::connect(
            &config.database.url,
            config.database.max_connections,
            config.connect_timeout(),
        )
        .await?,
    );
    store.migrate().await?;
    info!("Database ready");

    let mut metrics = MetricsServer::new(config.server.metrics_addr()?);
    metrics.start()?;
    info!(addr = %config.server.metrics_addr()?, "Metrics exporter started");

    let dispatcher = WebhookDispatcher::new(config.webhooks.clone())?;
    let env = LifecycleEnvironment::new(
        Arc::new(SystemClock),
        store.clone(),
        store,
        Arc::new(dispatcher),
        InviteLinkBuilder::new(config.invite_base_url.clone()),
    );
    let app = build_router(AppState::new(env));

    let addr = config.server.addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
