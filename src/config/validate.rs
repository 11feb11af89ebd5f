// src/config/validate.rs

use std::time::Duration;

use reqwest::Url;

use crate::config::model::{ConsoleConfig, DEFAULT_BASE_URL, RawConfigFile};
use crate::errors::{ConsoleError, Result};

impl TryFrom<RawConfigFile> for ConsoleConfig {
    type Error = ConsoleError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let base_url = raw
            .server
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_BASE_URL);

        Ok(ConsoleConfig::new_unchecked(
            validate_base_url(base_url)?,
            Duration::from_secs(raw.server.http_timeout_secs),
            Duration::from_millis(raw.feed.reconnect_delay_ms),
            Duration::from_secs(raw.feed.refetch_interval_secs),
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.server.http_timeout_secs == 0 {
        return Err(ConsoleError::Config(
            "[server].http_timeout_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.feed.reconnect_delay_ms == 0 {
        return Err(ConsoleError::Config(
            "[feed].reconnect_delay_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.feed.refetch_interval_secs == 0 {
        return Err(ConsoleError::Config(
            "[feed].refetch_interval_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

/// Check that `raw` is an absolute http(s) URL with a host.
///
/// Returns the URL text without trailing slashes, so paths can be appended
/// with a plain `format!`.
pub fn validate_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|e| ConsoleError::Config(format!("invalid base URL '{raw}': {e}")))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ConsoleError::Config(format!(
                "base URL '{raw}' must use http or https (got '{other}')"
            )));
        }
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConsoleError::Config(format!(
            "base URL '{raw}' has no host"
        )));
    }

    Ok(trimmed.to_string())
}
