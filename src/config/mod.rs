//! Configuration parsing and types.

pub mod env;
pub mod parser;
pub mod types;
pub mod validate;

use std::path::Path;

use tracing::warn;

use crate::common::error::ConfigError;

use parser::load_config;
use types::Config;

/// Load a config file, apply environment overrides, and validate the result.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    for var in env::check_empty_env_vars() {
        warn!("Environment variable {} is set but empty", var);
    }

    let config = env::apply_env_overrides(load_config(path)?);
    validate::validate_config(&config)?;
    Ok(config)
}
