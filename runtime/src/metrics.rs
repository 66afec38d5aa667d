//! Prometheus metrics for lifecycle transitions and webhook delivery.
//!
//! # Example
//!
//! ```rust,no_run
//! use guestlist_runtime::metrics::MetricsServer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! // Metrics available at http://localhost:9090/metrics
//! # Ok(())
//! # }
//! ```

use guestlist_core::WebhookKind;
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub use metrics::{counter, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus metrics server.
///
/// Installs the global recorder and serves `/metrics` on `addr` from a background task.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server bound to `addr` once started
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Registers metric descriptions, installs the recorder and spawns the HTTP listener.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built. A recorder that is already
    /// installed (e.g. by another test) is reported with a warning, not an error.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let (recorder, exporter) = PrometheusBuilder::new()
            .with_http_listener(self.addr)
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?
            .build()
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        let handle = recorder.handle();
        if metrics::set_global_recorder(recorder).is_err() {
            tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
            return Ok(());
        }

        let addr = self.addr;
        tokio::spawn(async move {
            if exporter.await.is_err() {
                tracing::error!(%addr, "metrics listener stopped");
            }
        });

        tracing::info!(addr = %self.addr, "Metrics server started - available at http://{}/metrics", self.addr);
        self.handle = Some(handle);
        Ok(())
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if the server hasn't been started.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn register_metrics() {
    describe_counter!(
        "lifecycle_transitions_total",
        "Committed edition and guest state transitions, by transition"
    );
    describe_counter!(
        "webhook_deliveries_total",
        "Webhook delivery attempts, by kind and outcome"
    );
    describe_histogram!(
        "webhook_delivery_duration_seconds",
        "Time taken by a webhook POST, including failures"
    );
}

/// Lifecycle transition recorder.
pub struct LifecycleMetrics;

impl LifecycleMetrics {
    /// Record one committed transition (`guest_invited`, `edition_archived`, ...).
    pub fn record_transition(transition: &'static str) {
        counter!("lifecycle_transitions_total", "transition" => transition).increment(1);
    }
}

/// Webhook delivery recorder.
pub struct WebhookMetrics;

impl WebhookMetrics {
    /// Record a delivery attempt that reached the network.
    pub fn record_delivery(kind: WebhookKind, outcome: &'static str, duration: Duration) {
        counter!("webhook_deliveries_total", "kind" => kind.as_str(), "outcome" => outcome)
            .increment(1);
        histogram!("webhook_delivery_duration_seconds", "kind" => kind.as_str())
            .record(duration.as_secs_f64());
    }

    /// Record a notification dropped because no endpoint is configured.
    pub fn record_skipped(kind: WebhookKind) {
        counter!("webhook_deliveries_total", "kind" => kind.as_str(), "outcome" => "skipped")
            .increment(1);
    }
}
