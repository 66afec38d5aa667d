//! Fire-and-forget webhook delivery.
//!
//! Each [`WebhookKind`] has its own optional endpoint. A notification is POSTed once, as
//! JSON, with a fixed timeout; failures are logged and counted, never retried, and never
//! reach the transition that produced them.

use crate::metrics::WebhookMetrics;
use guestlist_core::notification::{Notification, Notifier, WebhookKind};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Timeout applied to every delivery unless configured otherwise
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Endpoints per kind plus the delivery timeout
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebhookConfig {
    /// Endpoint for `guest_added`
    pub guest_added: Option<String>,
    /// Endpoint for `guest_confirmed`
    pub guest_confirmed: Option<String>,
    /// Endpoint for `guest_checked_in`
    pub guest_checked_in: Option<String>,
    /// Endpoint for `preselection_promoted`
    pub preselection_promoted: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            guest_added: None,
            guest_confirmed: None,
            guest_checked_in: None,
            preselection_promoted: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl WebhookConfig {
    /// Configured endpoint for `kind`, ignoring blank values
    #[must_use]
    pub fn endpoint(&self, kind: WebhookKind) -> Option<&str> {
        let url = match kind {
            WebhookKind::GuestAdded => &self.guest_added,
            WebhookKind::GuestConfirmed => &self.guest_confirmed,
            WebhookKind::GuestCheckedIn => &self.guest_checked_in,
            WebhookKind::PreselectionPromoted => &self.preselection_promoted,
        };
        url.as_deref().map(str::trim).filter(|url| !url.is_empty())
    }
}

/// Why a delivery failed
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The endpoint answered with a non-2xx status
    #[error("endpoint responded with status {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// No response within the configured timeout
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// Connection, TLS or client setup failure
    #[error("network error: {0}")]
    Network(String),
}

impl DeliveryError {
    const fn outcome(&self) -> &'static str {
        match self {
            Self::Status { .. } => "rejected",
            Self::Timeout(_) => "timeout",
            Self::Network(_) => "network_error",
        }
    }
}

/// What happened to a notification that did not fail
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The endpoint answered 2xx
    Delivered,
    /// No endpoint configured for the kind
    Skipped,
}

/// Posts notifications to their configured endpoints.
#[derive(Clone, Debug)]
pub struct WebhookDispatcher {
    client: reqwest::Client,
    config: Arc<WebhookConfig>,
}

impl WebhookDispatcher {
    /// Creates a dispatcher with its own HTTP client
    ///
    /// # Errors
    ///
    /// `Network` if the HTTP client cannot be initialized
    pub fn new(config: WebhookConfig) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DeliveryError::Network(e.to_string()))?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }

    /// Performs one delivery attempt and waits for it.
    ///
    /// # Errors
    ///
    /// Any [`DeliveryError`]; the caller decides whether to log it
    pub async fn deliver(&self, notification: &Notification) -> Result<DeliveryOutcome, DeliveryError> {
        let kind = notification.kind();
        let Some(url) = self.config.endpoint(kind) else {
            debug!(%kind, "no webhook endpoint configured, skipping");
            WebhookMetrics::record_skipped(kind);
            return Ok(DeliveryOutcome::Skipped);
        };

        let started = Instant::now();
        let result = match self.client.post(url).json(&notification.payload()).send().await {
            Ok(response) if response.status().is_success() => Ok(DeliveryOutcome::Delivered),
            Ok(response) => Err(DeliveryError::Status {
                status: response.status().as_u16(),
            }),
            Err(e) if e.is_timeout() => Err(DeliveryError::Timeout(self.config.timeout)),
            Err(e) => Err(DeliveryError::Network(e.to_string())),
        };

        let outcome = match &result {
            Ok(_) => "delivered",
            Err(error) => error.outcome(),
        };
        WebhookMetrics::record_delivery(kind, outcome, started.elapsed());
        result
    }

    /// Spawns delivery on the current Tokio runtime and returns immediately.
    ///
    /// Returns `None` (and drops the notification) when called outside a runtime.
    pub fn dispatch(&self, notification: Notification) -> Option<JoinHandle<()>> {
        let Ok(runtime) = Handle::try_current() else {
            warn!(kind = %notification.kind(), "no async runtime, webhook dropped");
            return None;
        };

        let dispatcher = self.clone();
        Some(runtime.spawn(async move {
            let kind = notification.kind();
            let guest_id = notification.guest().id;
            match dispatcher.deliver(&notification).await {
                Ok(DeliveryOutcome::Delivered) => debug!(%kind, %guest_id, "webhook delivered"),
                Ok(DeliveryOutcome::Skipped) => {}
                Err(error) => warn!(%kind, %guest_id, %error, "webhook delivery failed, not retrying"),
            }
        }))
    }
}

impl Notifier for WebhookDispatcher {
    fn notify(&self, notification: Notification) {
        // Detached: completion is observed through logs and metrics only.
        let _ = self.dispatch(notification);
    }
}
