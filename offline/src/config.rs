//! Client configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Offline client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the guestlist server
    pub server_url: String,
    /// Where the offline ledger is kept
    pub ledger_path: PathBuf,
    /// Time between replay passes
    pub sync_interval: Duration,
    /// Per-request timeout; beyond it the server counts as unreachable
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Load configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, falling back to defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let seconds = |key: &str, default: u64| {
            Duration::from_secs(
                lookup(key)
                    .and_then(|value| value.trim().parse().ok())
                    .unwrap_or(default),
            )
        };

        Self {
            server_url: lookup("GUESTLIST_SERVER_URL")
                .unwrap_or_else(|| "http://localhost:8080".to_string()),
            ledger_path: lookup("GUESTLIST_LEDGER_PATH")
                .map_or_else(|| PathBuf::from("guestlist-offline-ledger.json"), PathBuf::from),
            sync_interval: seconds("GUESTLIST_SYNC_INTERVAL_SECS", 15),
            request_timeout: seconds("GUESTLIST_REQUEST_TIMEOUT_SECS", 5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(|_| None);
        assert_eq!(config.server_url, "http://localhost:8080");
        assert_eq!(config.sync_interval, Duration::from_secs(15));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(|key| match key {
            "GUESTLIST_LEDGER_PATH" => Some("/var/lib/door/ledger.json".to_string()),
            "GUESTLIST_SYNC_INTERVAL_SECS" => Some("60".to_string()),
            "GUESTLIST_REQUEST_TIMEOUT_SECS" => Some("soon".to_string()),
            _ => None,
        });
        assert_eq!(config.ledger_path, PathBuf::from("/var/lib/door/ledger.json"));
        assert_eq!(config.sync_interval, Duration::from_secs(60));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }
}
