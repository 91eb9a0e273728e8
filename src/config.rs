//! Client configuration.
//!
//! Every timing knob of the tracker lives here. Durations deserialize from
//! milliseconds so the struct can be embedded in a host application's own
//! config file.

use serde::{Deserialize, Deserializer};
use std::time::Duration;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Largest gossip age (as reported by the cluster) still considered alive.
pub const DEFAULT_LIVENESS_THRESHOLD: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Delay between two refresher ticks.
    #[serde(rename = "refresh_interval_ms", deserialize_with = "duration_ms")]
    pub refresh_interval: Duration,
    /// Upper bound on a whole request, body included.
    #[serde(rename = "request_timeout_ms", deserialize_with = "duration_ms")]
    pub request_timeout: Duration,
    #[serde(rename = "connect_timeout_ms", deserialize_with = "duration_ms")]
    pub connect_timeout: Duration,
    pub liveness_threshold: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            liveness_threshold: DEFAULT_LIVENESS_THRESHOLD,
        }
    }
}

impl ClientConfig {
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_liveness_threshold(mut self, threshold: f64) -> Self {
        self.liveness_threshold = threshold;
        self
    }
}

fn duration_ms<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}
