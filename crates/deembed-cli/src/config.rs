//! Run configuration loading and command-line overrides.

use anyhow::{Context, Result};
use deembed_core::calibration::{DeembedConfig, SingularityPolicy};
use std::path::Path;

/// Load a configuration file (JSON when the extension is `.json`, TOML otherwise).
pub fn load_config(path: &Path) -> Result<DeembedConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: DeembedConfig = if path.extension().is_some_and(|e| e == "json") {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config as JSON: {:?}", path))?
    } else {
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config as TOML: {:?}", path))?
    };

    config
        .validate()
        .with_context(|| format!("Invalid configuration in {:?}", path))?;

    Ok(config)
}

/// Flags that override individual configuration fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub z0: Option<f64>,
    pub policy: Option<SingularityPolicy>,
}

/// Build the effective configuration: file (or defaults) then flags.
pub fn resolve(path: Option<&Path>, overrides: Overrides) -> Result<DeembedConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => DeembedConfig::default(),
    };

    if let Some(z0) = overrides.z0 {
        config.reference_impedance_ohms = z0;
    }
    if let Some(policy) = overrides.policy {
        config.singularity_policy = policy;
    }

    config.validate().context("Invalid command-line override")?;
    tracing::debug!(?config, "effective configuration");
    Ok(config)
}
