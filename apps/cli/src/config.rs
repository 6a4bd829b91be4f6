//! CLI configuration loading.

use std::path::Path;

use anyhow::Context;
use tariffcast_core::Config;

/// Load the configuration.
///
/// Precedence:
/// 1. `--config` argument
/// 2. `TARIFFCAST_CONFIG` environment variable
/// 3. Defaults
pub fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::from_path(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Config::load().context("Failed to load configuration"),
    }
}
