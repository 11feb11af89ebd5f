// src/config/mod.rs

//! Configuration loading and validation for the console.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk and apply env/CLI overrides (`loader.rs`).
//! - Validate URLs and timing values (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{base_url_from_host, default_config_path, load_and_validate, load_from_path, resolve};
pub use model::{ConsoleConfig, FeedSection, RawConfigFile, ServerSection};
pub use validate::validate_base_url;
