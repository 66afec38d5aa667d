//! Door-side sync agent.
//!
//! Replays check-ins captured offline against the server until Ctrl+C.

use guestlist_core::environment::SystemClock;
use guestlist_offline::{ClientConfig, FileLedger, HttpCheckinGateway, OfflineReconciler};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,guestlist=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env();
    info!(
        server_url = %config.server_url,
        ledger = %config.ledger_path.display(),
        "Starting offline sync agent"
    );

    let gateway = HttpCheckinGateway::new(config.server_url.clone(), config.request_timeout)?;
    let reconciler = OfflineReconciler::open(
        Arc::new(gateway),
        Arc::new(FileLedger::new(config.ledger_path.clone())),
        Arc::new(SystemClock),
    )
    .await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        shutdown_tx.send(true).ok();
    });

    reconciler.run(config.sync_interval, shutdown_rx).await;
    Ok(())
}
