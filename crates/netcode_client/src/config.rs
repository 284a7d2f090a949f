//! # Client Configuration
//!
//! Transport timings and worker limits, loadable from TOML.
//!
//! ```toml
//! ping_interval_ms = 1000
//! peer_timeout_ms = 5000
//! service_timeout_ms = 15
//! ```
//!
//! Missing keys fall back to the defaults below.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::transport::PeerSettings;

/// Client configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Interval between transport keep-alive pings.
    pub ping_interval_ms: u64,
    /// Peer timeout limit.
    pub peer_timeout_ms: u64,
    /// Minimum time without acknowledgement before the peer times out.
    pub peer_timeout_min_ms: u64,
    /// Maximum time without acknowledgement before the peer times out.
    pub peer_timeout_max_ms: u64,
    /// Bounded wait of the first transport service call per iteration.
    pub service_timeout_ms: u64,
    /// Upper bound on transport events handled per worker iteration.
    pub max_events_per_iteration: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ping_interval_ms: 1000,
            peer_timeout_ms: 5000,
            peer_timeout_min_ms: 5000,
            peer_timeout_max_ms: 5000,
            service_timeout_ms: 15,
            max_events_per_iteration: 256,
        }
    }
}

impl ClientConfig {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not valid TOML or has unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads a config file from disk.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Per-peer ping and timeout settings handed to the transport.
    #[must_use]
    pub const fn peer_settings(&self) -> PeerSettings {
        PeerSettings {
            ping_interval: Duration::from_millis(self.ping_interval_ms),
            timeout: Duration::from_millis(self.peer_timeout_ms),
            timeout_min: Duration::from_millis(self.peer_timeout_min_ms),
            timeout_max: Duration::from_millis(self.peer_timeout_max_ms),
        }
    }

    /// Bounded wait of the first service call per iteration.
    #[inline]
    #[must_use]
    pub const fn service_timeout(&self) -> Duration {
        Duration::from_millis(self.service_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        let peer = config.peer_settings();
        assert_eq!(peer.ping_interval, Duration::from_secs(1));
        assert_eq!(peer.timeout, Duration::from_secs(5));
        assert_eq!(peer.timeout_min, Duration::from_secs(5));
        assert_eq!(peer.timeout_max, Duration::from_secs(5));
        assert_eq!(config.service_timeout(), Duration::from_millis(15));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ClientConfig::from_toml_str(
            r"
            ping_interval_ms = 250
            max_events_per_iteration = 32
            ",
        )
        .unwrap();

        assert_eq!(config.ping_interval_ms, 250);
        assert_eq!(config.max_events_per_iteration, 32);
        assert_eq!(config.peer_timeout_ms, 5000);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = ClientConfig::from_toml_str("tick_rate = 60").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ClientConfig::load("/nonexistent/netcode/client.toml").unwrap_err();
        match err {
            ConfigError::Io { path, .. } => {
                assert!(path.ends_with("client.toml"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
