use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::ForgeConfig, ConfigError};

/// Prefix for environment variable overrides, e.g. `FILEFORGE_BATCH__MAX_CONCURRENCY=8`.
const ENV_PREFIX: &str = "FILEFORGE_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<ForgeConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: ForgeConfig = Figment::from(Serialized::defaults(ForgeConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from an optional file.
///
/// Without a path, built-in defaults are used and environment overrides still apply.
pub fn load_config_or_default(path: Option<&Path>) -> Result<ForgeConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Figment::from(Serialized::defaults(ForgeConfig::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string())),
    }
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<ForgeConfig, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
