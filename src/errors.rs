// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Upstream answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        ConsoleError::Transport(err.to_string())
    }
}

impl ConsoleError {
    /// Whether this error came back from the server as a 4xx/5xx.
    pub fn is_upstream(&self) -> bool {
        matches!(self, ConsoleError::Api { .. })
    }

    /// Message without the category prefix, for user-facing one-liners.
    pub fn detail(&self) -> String {
        match self {
            ConsoleError::Transport(msg) | ConsoleError::Config(msg) => msg.clone(),
            ConsoleError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ConsoleError>;
