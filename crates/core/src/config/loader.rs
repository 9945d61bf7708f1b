use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "SUPPORTQ_";

/// Layered sources: the TOML file, then `SUPPORTQ_*` variables on top.
///
/// Nested keys use a double underscore, e.g. `SUPPORTQ_STORE__SEED_DEMO=true`
/// or `SUPPORTQ_AGENT__ID=agent-4`.
fn sources(path: &Path) -> Figment {
    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load configuration from a file, applying environment overrides.
///
/// A missing file is an error rather than an empty config, so a typo in
/// `SUPPORTQ_CONFIG` doesn't silently start a server on defaults.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    sources(path)
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Parse a TOML document with no environment layer.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
