// src/config/loader.rs

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConsoleConfig, DEFAULT_PORT, RawConfigFile};
use crate::errors::Result;

pub const ENV_BASE_URL: &str = "CAESIUM_BASE_URL";
pub const ENV_HOST: &str = "CAESIUM_HOST";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Like [`load_from_path`], but a missing file yields the defaults.
pub fn load_optional(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file, using defaults");
            Ok(RawConfigFile::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// Load the optional config file, apply overrides from the CLI flag and the
/// process environment, and validate the result.
///
/// Base URL priority:
/// 1. `--base-url`
/// 2. `CAESIUM_BASE_URL`
/// 3. `CAESIUM_HOST` (scheme and port filled in when missing)
/// 4. `[server].base_url` from the file
/// 5. `http://127.0.0.1:8080`
pub fn load_and_validate(
    path: impl AsRef<Path>,
    cli_base_url: Option<&str>,
) -> Result<ConsoleConfig> {
    let raw = load_optional(path)?;
    resolve(raw, cli_base_url, |key| std::env::var(key).ok())
}

/// Apply overrides to a raw config and validate it.
///
/// `env` looks up environment variables; tests pass a closure over a map.
pub fn resolve<F>(mut raw: RawConfigFile, cli_base_url: Option<&str>, env: F) -> Result<ConsoleConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

    let override_url = non_empty(cli_base_url.map(str::to_string))
        .or_else(|| non_empty(env(ENV_BASE_URL)))
        .or_else(|| non_empty(env(ENV_HOST)).map(|host| base_url_from_host(&host)));

    if let Some(url) = override_url {
        raw.server.base_url = Some(url);
    }

    ConsoleConfig::try_from(raw)
}

/// Turn a bare host (optionally with scheme and/or port) into a base URL.
///
/// `example.com` becomes `http://example.com:8080`; a value that already has
/// a scheme or a port keeps it.
pub fn base_url_from_host(host: &str) -> String {
    let host = host.trim();
    let with_scheme = if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    };

    let authority = with_scheme
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or_default();
    if authority.contains(':') {
        with_scheme
    } else {
        format!("{}:{DEFAULT_PORT}", with_scheme.trim_end_matches('/'))
    }
}

/// Default config file location: `caesium-console.toml` in the working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("caesium-console.toml")
}
