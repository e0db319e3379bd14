//! Client configuration.

use crate::error::ConfigError;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1";

/// Settings for the REST client, the pollers and the state actors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DineInConfig {
    /// API root, e.g. `http://localhost:8080/api/v1`
    pub base_url: String,

    pub request_timeout: Duration,

    /// Interval for both the order status observer and the kitchen queue.
    pub poll_interval: Duration,

    /// How long a confirmed kitchen write is protected from older poll results.
    pub write_grace: Duration,

    /// Request channel capacity of each state actor.
    pub actor_buffer: usize,
}

impl Default for DineInConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(5),
            write_grace: Duration::from_secs(2),
            actor_buffer: 32,
        }
    }
}

impl DineInConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Reads `DINEIN_BASE_URL`, `DINEIN_TIMEOUT_SECS`, `DINEIN_POLL_SECS` and
    /// `DINEIN_WRITE_GRACE_MS`. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match lookup("DINEIN_BASE_URL") {
            Some(url) if !url.trim().is_empty() => config.base_url = url.trim().to_string(),
            _ => info!(base_url = %config.base_url, "DINEIN_BASE_URL not set, using default"),
        }
        if let Some(secs) = parse_u64(&lookup, "DINEIN_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_u64(&lookup, "DINEIN_POLL_SECS")? {
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    key: "DINEIN_POLL_SECS",
                    value: secs.to_string(),
                });
            }
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(ms) = parse_u64(&lookup, "DINEIN_WRITE_GRACE_MS")? {
            config.write_grace = Duration::from_millis(ms);
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_write_grace(mut self, grace: Duration) -> Self {
        self.write_grace = grace;
        self
    }

    pub fn with_actor_buffer(mut self, buffer: usize) -> Self {
        self.actor_buffer = buffer.max(1);
        self
    }
}

fn parse_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<u64>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
