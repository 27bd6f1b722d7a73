//! TOML configuration file support for pipeline defaults.
//!
//! Instead of passing flags on every invocation, users can keep settings in
//! a config file:
//!
//! ```toml
//! # evset.toml
//! [apply]
//! sampling_rate = 10.0
//! force_dense = false
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Root configuration structure for evset.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Settings for the apply command.
    #[serde(default)]
    pub apply: ApplyConfig,
}

/// Configuration for the apply command.
#[derive(Debug, Default, Deserialize)]
pub struct ApplyConfig {
    /// Shared dense sampling rate in Hz.
    pub sampling_rate: Option<f64>,

    /// Convert every column to dense before writing.
    pub force_dense: Option<bool>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}
