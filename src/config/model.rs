// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_PORT: u16 = 8080;

/// Configuration as read from a TOML file.
///
/// ```toml
/// [server]
/// base_url = "http://127.0.0.1:8080"
/// http_timeout_secs = 10
///
/// [feed]
/// reconnect_delay_ms = 5000
/// refetch_interval_secs = 10
/// ```
///
/// Every section and key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub feed: FeedSection,
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    /// Base URL of the API server. The `/v1` prefix is added by the client.
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            base_url: None,
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

/// `[feed]` section: event-stream and polling-fallback timing.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedSection {
    /// Fixed delay before reopening a dropped event stream.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Interval of the periodic snapshot refetch running alongside the feed.
    #[serde(default = "default_refetch_interval_secs")]
    pub refetch_interval_secs: u64,
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: default_reconnect_delay_ms(),
            refetch_interval_secs: default_refetch_interval_secs(),
        }
    }
}

fn default_http_timeout_secs() -> u64 {
    10
}

fn default_reconnect_delay_ms() -> u64 {
    5000
}

fn default_refetch_interval_secs() -> u64 {
    10
}

/// Validated configuration used by the rest of the crate.
///
/// Only constructed through `TryFrom<RawConfigFile>` (see `validate.rs`) or
/// the loader, so every value here has passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleConfig {
    pub base_url: String,
    pub http_timeout: Duration,
    pub reconnect_delay: Duration,
    pub refetch_interval: Duration,
}

impl ConsoleConfig {
    pub(crate) fn new_unchecked(
        base_url: String,
        http_timeout: Duration,
        reconnect_delay: Duration,
        refetch_interval: Duration,
    ) -> Self {
        Self {
            base_url,
            http_timeout,
            reconnect_delay,
            refetch_interval,
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        let feed = FeedSection::default();
        Self::new_unchecked(
            DEFAULT_BASE_URL.to_string(),
            Duration::from_secs(default_http_timeout_secs()),
            Duration::from_millis(feed.reconnect_delay_ms),
            Duration::from_secs(feed.refetch_interval_secs),
        )
    }
}
