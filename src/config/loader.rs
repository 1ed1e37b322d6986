use anyhow::{anyhow, Context, Result};
use config::{Config, Environment, File};
use std::path::Path;
use tracing::{debug, info};

use super::settings::EngineSettings;

/// Prefix for environment overrides, e.g. `WLPA_SIGNIFICANCE_THRESHOLD=3`
pub const ENV_PREFIX: &str = "WLPA";

/// Loads settings from defaults, then the optional TOML file at `path`,
/// then `WLPA_*` environment variables.
pub fn load_settings(path: Option<&Path>) -> Result<EngineSettings> {
    let mut builder = Config::builder().add_source(
        Config::try_from(&EngineSettings::default()).context("Failed to encode default settings")?,
    );

    if let Some(path) = path {
        if path.exists() {
            info!("Loading settings from {}", path.display());
        } else {
            debug!("Settings file {} not found, using defaults", path.display());
        }
        builder = builder.add_source(File::from(path).required(false));
    }

    let settings: EngineSettings = builder
        .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .build()
        .context("Failed to read settings")?
        .try_deserialize()
        .context("Failed to parse settings")?;

    settings
        .validate()
        .map_err(|errors| anyhow!("Invalid settings: {}", errors.join(", ")))?;

    Ok(settings)
}

/// Effective settings rendered as TOML
pub fn to_toml(settings: &EngineSettings) -> Result<String> {
    Ok(toml::to_string_pretty(settings)?)
}
